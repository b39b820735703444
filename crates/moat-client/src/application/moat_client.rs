//! MoatClient: the two MOAT protocol operations over an injected transport.
//!
//! This use case sits at the application layer and delegates to a
//! [`MoatTransport`] trait object for the actual proxied HTTP exchange.
//! The SOCKS-pinned implementation lives in the infrastructure layer;
//! tests inject scripted transports instead.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use moat_core::protocol::codec;
use moat_core::protocol::messages::{
    Envelope, SolutionAnswer, TransportsQuery, CHECK_ENDPOINT, FETCH_ENDPOINT,
};
use moat_core::{BridgeSet, Challenge, MoatError};

/// Error type for a single proxied HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange failed before a response body could be read: proxy
    /// unreachable, connect refused, timeout, TLS failure, or an
    /// unreadable body.  Carries the underlying cause's message.
    #[error("{0}")]
    Exchange(String),
    /// The server answered with a non-success HTTP status.  The body is
    /// retained when it was readable JSON so the caller can extract a
    /// server-supplied error detail.
    #[error("server returned HTTP {status}")]
    Status {
        status: u16,
        body: Option<Value>,
    },
}

/// One proxied HTTP exchange with the bridge distribution server.
///
/// Implementations POST the JSON `body` to `{base_url}/{endpoint}` with
/// the protocol content type and return the parsed JSON response body.
/// Exactly one network exchange happens per call.
#[async_trait]
pub trait MoatTransport: Send + Sync {
    /// Sends the body and awaits the server's JSON response.
    async fn send(&self, endpoint: &str, body: Value) -> Result<Value, TransportError>;
}

/// The MOAT protocol client.
///
/// Stateless apart from the injected transport: sequencing and challenge
/// ownership are the session's responsibility.
pub struct MoatClient<T: MoatTransport> {
    transport: T,
}

impl<T: MoatTransport> MoatClient<T> {
    /// Creates a client over the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Step one: announce supported transports, receive a captcha.
    ///
    /// POSTs the client-transports envelope to `fetch` and parses the
    /// challenge token plus the base64 image into a [`Challenge`].
    ///
    /// # Errors
    ///
    /// Returns [`MoatError`] on any transport, parse, or server-reported
    /// failure, with the server's error detail preferred as the message.
    pub async fn fetch_captcha(&self) -> Result<Challenge, MoatError> {
        let body = envelope(TransportsQuery::obfs4())?;
        debug!("fetching captcha challenge");
        let response = self
            .transport
            .send(FETCH_ENDPOINT, body)
            .await
            .map_err(classify_transport)?;
        codec::parse_fetch_response(&response)
            .map_err(|e| MoatError::classify(Some(&response), e))
    }

    /// Step two: submit the user's solution, receive bridge lines.
    ///
    /// The token must come from the most recent successful
    /// [`fetch_captcha`](Self::fetch_captcha); the session enforces that
    /// a token is used at most once.
    ///
    /// # Errors
    ///
    /// Returns [`MoatError`] on any transport, parse, or server-reported
    /// failure (a wrong solution arrives as a server error detail).
    pub async fn submit_solution(
        &self,
        challenge_token: &str,
        solution: &str,
    ) -> Result<BridgeSet, MoatError> {
        let body = envelope(SolutionAnswer::obfs4(challenge_token, solution))?;
        debug!("submitting captcha solution");
        let response = self
            .transport
            .send(CHECK_ENDPOINT, body)
            .await
            .map_err(classify_transport)?;
        codec::parse_check_response(&response)
            .map_err(|e| MoatError::classify(Some(&response), e))
    }
}

/// Wraps a payload in the single-element request envelope.
///
/// Serialization of these fixed-shape payloads cannot realistically fail,
/// but the guard keeps a malformed envelope from ever reaching the wire.
fn envelope<P: Serialize>(payload: P) -> Result<Value, MoatError> {
    serde_json::to_value(Envelope::single(payload)).map_err(|e| MoatError::new(e.to_string()))
}

/// Collapses a transport failure into the user-facing error.
///
/// A non-success status whose body is a server error envelope surfaces
/// the `detail` verbatim; everything else surfaces the transport error's
/// own message.
fn classify_transport(err: TransportError) -> MoatError {
    if let TransportError::Status { body: Some(body), .. } = &err {
        if let Some(detail) = codec::error_detail(body) {
            return MoatError::new(detail);
        }
    }
    MoatError::new(err.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
