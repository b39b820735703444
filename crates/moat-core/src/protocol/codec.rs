//! Response parsing and error classification for the MOAT exchange.
//!
//! Success envelopes are parsed into domain entities; only the first
//! element of `data` is read.  The captcha image arrives base64-encoded
//! and is decoded here, so the rest of the client only ever sees raw
//! bytes.
//!
//! # Error classification
//!
//! The server reports protocol-level failures (wrong solution, expired
//! challenge) as an error envelope `{"errors":[{"detail":"..."}]}`.  When
//! a response body parses as that shape, the `detail` string is preferred
//! verbatim as the user-facing message; otherwise the underlying transport
//! or parse failure's own message is used.  The caller is never given a
//! programmatic distinction between the two beyond the message text.
//!
//! The `version` field of responses is deliberately not verified, and the
//! server's offered transport list is not checked: obfs4 is assumed
//! available and the server is trusted to answer with the version it was
//! asked for.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::bridges::BridgeSet;
use crate::domain::challenge::Challenge;
use crate::protocol::messages::{CheckPayload, Envelope, ErrorEnvelope, FetchPayload};

/// Errors produced while decoding a success envelope.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The envelope parsed but its `data` array was empty.
    #[error("response envelope contains no data elements")]
    EmptyEnvelope,
    /// The body was not a success envelope of the expected shape.
    #[error("malformed response envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    /// The captcha image field was not valid base64.
    #[error("captcha image is not valid base64: {0}")]
    Image(#[from] base64::DecodeError),
}

/// The single user-facing error the client surfaces for a failed attempt.
///
/// Transport failures, malformed envelopes, and server-reported errors all
/// collapse into this type; terminal for the current attempt and carrying
/// nothing but a display message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MoatError {
    message: String,
}

impl MoatError {
    /// Wraps a display message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Classifies a failure, preferring the server's error detail.
    ///
    /// When `body` is present and parses as an error envelope, its first
    /// `detail` becomes the message verbatim.  Otherwise the message is the
    /// rendered `cause` (the transport or parse failure).
    pub fn classify(body: Option<&Value>, cause: impl fmt::Display) -> Self {
        if let Some(detail) = body.and_then(error_detail) {
            debug!(%detail, "server reported an error envelope");
            return Self::new(detail);
        }
        Self::new(cause.to_string())
    }
}

/// Extracts `errors[0].detail` from a body, when it has that shape.
pub fn error_detail(body: &Value) -> Option<String> {
    let envelope = ErrorEnvelope::deserialize(body).ok()?;
    envelope.errors.into_iter().next().map(|e| e.detail)
}

/// Parses a `fetch` success body into a [`Challenge`].
///
/// Reads `data[0].challenge` and `data[0].image`, decoding the image from
/// base64.  Any missing field, wrong type, or undecodable image is a
/// [`CodecError`].
pub fn parse_fetch_response(body: &Value) -> Result<Challenge, CodecError> {
    let envelope = Envelope::<FetchPayload>::deserialize(body)?;
    let payload = envelope.into_first().ok_or(CodecError::EmptyEnvelope)?;
    let image = BASE64.decode(payload.image.as_bytes())?;
    debug!(token = %payload.challenge, image_bytes = image.len(), "parsed captcha challenge");
    Ok(Challenge::new(payload.challenge, image))
}

/// Parses a `check` success body into a [`BridgeSet`].
///
/// Reads `data[0].bridges`, preserving the server-supplied order.
pub fn parse_check_response(body: &Value) -> Result<BridgeSet, CodecError> {
    let envelope = Envelope::<CheckPayload>::deserialize(body)?;
    let payload = envelope.into_first().ok_or(CodecError::EmptyEnvelope)?;
    debug!(count = payload.bridges.len(), "parsed bridge lines");
    Ok(BridgeSet::new(payload.bridges))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fetch_response_decodes_token_and_image() {
        // Arrange: "aGVsbG8=" is base64 for the five bytes of "hello"
        let body = json!({"data":[{"challenge":"abc","image":"aGVsbG8="}]});

        // Act
        let challenge = parse_fetch_response(&body).unwrap();

        // Assert
        assert_eq!(challenge.token, "abc");
        assert_eq!(challenge.image, b"hello");
    }

    #[test]
    fn test_parse_fetch_response_reads_only_first_data_element() {
        // Arrange: a second element with garbage must be ignored
        let body = json!({"data":[
            {"challenge":"first","image":"aGk="},
            {"challenge":"second","image":"not base64!!!"}
        ]});

        // Act
        let challenge = parse_fetch_response(&body).unwrap();

        // Assert
        assert_eq!(challenge.token, "first");
    }

    #[test]
    fn test_parse_fetch_response_rejects_missing_field() {
        let body = json!({"data":[{"challenge":"abc"}]});
        assert!(matches!(
            parse_fetch_response(&body),
            Err(CodecError::Envelope(_))
        ));
    }

    #[test]
    fn test_parse_fetch_response_rejects_wrong_type() {
        let body = json!({"data":[{"challenge":42,"image":"aGk="}]});
        assert!(matches!(
            parse_fetch_response(&body),
            Err(CodecError::Envelope(_))
        ));
    }

    #[test]
    fn test_parse_fetch_response_rejects_invalid_base64() {
        let body = json!({"data":[{"challenge":"abc","image":"!!not-base64!!"}]});
        assert!(matches!(
            parse_fetch_response(&body),
            Err(CodecError::Image(_))
        ));
    }

    #[test]
    fn test_parse_fetch_response_rejects_empty_data() {
        let body = json!({"data":[]});
        assert!(matches!(
            parse_fetch_response(&body),
            Err(CodecError::EmptyEnvelope)
        ));
    }

    #[test]
    fn test_parse_check_response_preserves_order() {
        // Arrange
        let body = json!({"data":[{"bridges":["bridge1 1.2.3.4:443","bridge2 5.6.7.8:443"]}]});

        // Act
        let bridges = parse_check_response(&body).unwrap();

        // Assert: stored form is exactly the newline-joined server order
        assert_eq!(
            bridges.to_storage_string(),
            "bridge1 1.2.3.4:443\nbridge2 5.6.7.8:443\n"
        );
    }

    #[test]
    fn test_parse_check_response_rejects_non_string_bridges() {
        let body = json!({"data":[{"bridges":[1,2,3]}]});
        assert!(parse_check_response(&body).is_err());
    }

    #[test]
    fn test_error_detail_extracts_first_detail() {
        let body = json!({"errors":[{"detail":"wrong solution"},{"detail":"second"}]});
        assert_eq!(error_detail(&body), Some("wrong solution".to_string()));
    }

    #[test]
    fn test_error_detail_none_for_success_shape() {
        let body = json!({"data":[{"bridges":[]}]});
        assert_eq!(error_detail(&body), None);
    }

    #[test]
    fn test_classify_prefers_server_detail_over_cause() {
        // Arrange
        let body = json!({"errors":[{"detail":"wrong solution"}]});

        // Act
        let err = MoatError::classify(Some(&body), "HTTP 419 whatever");

        // Assert: the detail wins, verbatim
        assert_eq!(err.message(), "wrong solution");
    }

    #[test]
    fn test_classify_falls_back_to_cause_without_body() {
        let err = MoatError::classify(None, "connection refused");
        assert_eq!(err.message(), "connection refused");
    }

    #[test]
    fn test_classify_falls_back_when_body_is_not_an_error_envelope() {
        let body = json!({"data":[{"challenge":"x"}]});
        let err = MoatError::classify(Some(&body), "malformed response envelope");
        assert_eq!(err.message(), "malformed response envelope");
    }
}
