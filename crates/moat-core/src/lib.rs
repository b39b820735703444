//! # moat-core
//!
//! Shared library for the MOAT bridge-distribution client containing the
//! wire protocol types, the response codec, and the domain entities.
//!
//! This crate is used by the client application and by its tests.
//! It has zero dependencies on sockets, HTTP libraries, or the async runtime.
//!
//! # What is MOAT? (for beginners)
//!
//! MOAT is a captcha-gated protocol spoken with a bridge database server to
//! obtain *bridge lines*: addresses of non-public relays used to bypass
//! network blocking.  The exchange has exactly two steps:
//!
//! 1. **fetch** – the client announces which pluggable transports it
//!    supports and receives a captcha image plus an opaque challenge token.
//! 2. **check** – the client submits the token together with the user's
//!    captcha solution and, if the solution is accepted, receives the
//!    bridge lines.
//!
//! Both steps are HTTP POSTs whose bodies are wrapped in the same JSON
//! envelope, `{"data":[{...}]}`, and both must be routed through an
//! anonymizing SOCKS proxy so the request itself cannot be blocked or
//! observed.
//!
//! This crate defines:
//!
//! - **`protocol`** – The envelope and payload types that travel over the
//!   wire, and the codec that parses server responses and classifies
//!   server-reported errors.
//!
//! - **`domain`** – Pure entities with no wire knowledge: the anonymizing
//!   network status, the SOCKS proxy endpoint, the live captcha challenge,
//!   and the ordered set of bridge lines.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `moat_core::Challenge` instead of `moat_core::domain::challenge::Challenge`.
pub use domain::bridges::BridgeSet;
pub use domain::challenge::Challenge;
pub use domain::status::{ProxyEndpoint, StatusEvent, TorStatus, DEFAULT_SOCKS_HOST, DEFAULT_SOCKS_PORT};
pub use protocol::codec::{CodecError, MoatError};
pub use protocol::messages::Envelope;
