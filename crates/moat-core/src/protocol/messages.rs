//! Typed request and response payloads for the MOAT exchange.
//!
//! The original protocol clients built these bodies by string
//! concatenation, which meant a crafted captcha solution could break out
//! of its JSON string.  Here every payload is a serde struct, so
//! user-supplied text is embedded byte-for-byte with JSON string encoding
//! as the only transformation.
//!
//! # Request shapes
//!
//! ```json
//! {"data":[{"version":"0.1.0","type":"client-transports","supported":["obfs4"]}]}
//! {"data":[{"version":"0.1.0","id":"2","type":"moat-solution","transport":"obfs4",
//!           "challenge":"<token>","solution":"<text>","qrcode":"false"}]}
//! ```
//!
//! Field order in the serialized JSON follows declaration order, so the
//! bodies above are reproduced exactly.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Protocol version requested from the server.
///
/// The server's reply is trusted to speak the same version; the response
/// codec deliberately does not verify it.
pub const MOAT_VERSION: &str = "0.1.0";

/// The single pluggable transport this client offers and requests.
pub const TRANSPORT_OBFS4: &str = "obfs4";

/// Default base URL of the bridge distribution server.
pub const DEFAULT_BASE_URL: &str = "https://bridges.torproject.org/moat";

/// Endpoint of the captcha-fetch step, relative to the base URL.
pub const FETCH_ENDPOINT: &str = "fetch";

/// Endpoint of the solution-check step, relative to the base URL.
pub const CHECK_ENDPOINT: &str = "check";

/// Content type sent with every MOAT request.
pub const CONTENT_TYPE_VND_API_JSON: &str = "application/vnd.api+json";

/// Fixed request id the server expects on the solution-check payload.
pub const SOLUTION_REQUEST_ID: &str = "2";

// ── Envelope ──────────────────────────────────────────────────────────────────

/// The wire-level wrapper used by both requests and responses.
///
/// Requests always carry exactly one element.  Responses may carry more;
/// only the first element is read and the rest are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The payload elements.
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    /// Wraps a single payload element, the only shape requests use.
    pub fn single(item: T) -> Self {
        Self { data: vec![item] }
    }

    /// Consumes the envelope, yielding the first payload element.
    pub fn into_first(self) -> Option<T> {
        self.data.into_iter().next()
    }
}

// ── Request payloads ──────────────────────────────────────────────────────────

/// Payload of the `fetch` step: announce the transports the client supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportsQuery {
    /// Protocol version, always [`MOAT_VERSION`].
    pub version: String,
    /// Payload discriminant, always `"client-transports"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Transports the client can use.
    pub supported: Vec<String>,
}

impl TransportsQuery {
    /// The fixed query this client sends: obfs4 only.
    pub fn obfs4() -> Self {
        Self {
            version: MOAT_VERSION.to_string(),
            kind: "client-transports".to_string(),
            supported: vec![TRANSPORT_OBFS4.to_string()],
        }
    }
}

/// Payload of the `check` step: the challenge token plus the user's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionAnswer {
    /// Protocol version, always [`MOAT_VERSION`].
    pub version: String,
    /// Fixed request id, always [`SOLUTION_REQUEST_ID`].
    pub id: String,
    /// Payload discriminant, always `"moat-solution"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Transport the bridges are requested for.
    pub transport: String,
    /// Token from the most recent successful `fetch`.
    pub challenge: String,
    /// The user's captcha answer, embedded verbatim.
    pub solution: String,
    /// Whether the server should render the bridges as a QR code.
    pub qrcode: String,
}

impl SolutionAnswer {
    /// Builds the fixed-shape obfs4 solution payload.
    pub fn obfs4(challenge: impl Into<String>, solution: impl Into<String>) -> Self {
        Self {
            version: MOAT_VERSION.to_string(),
            id: SOLUTION_REQUEST_ID.to_string(),
            kind: "moat-solution".to_string(),
            transport: TRANSPORT_OBFS4.to_string(),
            challenge: challenge.into(),
            solution: solution.into(),
            qrcode: "false".to_string(),
        }
    }
}

// ── Response payloads ─────────────────────────────────────────────────────────

/// Success payload of the `fetch` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchPayload {
    /// Opaque challenge token to echo back on `check`.
    pub challenge: String,
    /// Captcha image, base64-encoded.
    pub image: String,
}

/// Success payload of the `check` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckPayload {
    /// Bridge lines in the order the server chose.
    pub bridges: Vec<String>,
}

/// The error envelope either step may return instead of a success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Server-reported errors; only the first is read.
    pub errors: Vec<ErrorDetail>,
}

/// A single server-reported error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message intended for display.
    pub detail: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
