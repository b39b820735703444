//! moat-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does moat-client do? (for beginners)
//!
//! Users behind censored networks need *bridges*: non-public relay
//! addresses the censor has not blocked yet.  The MOAT protocol hands
//! those out from a distribution server, gated by a captcha so the
//! censor cannot simply enumerate them.  There is a chicken-and-egg
//! problem in contacting that server from a censored network, so every
//! MOAT request is routed through the anonymizing network's own SOCKS
//! proxy (reachable via a built-in tunnel) rather than the open internet.
//!
//! The client application:
//!
//! 1. Watches the network-control collaborator's readiness notifications
//!    and asks it to start the anonymizing network if it is off.
//! 2. Once the network is on, builds an HTTP transport pinned to the
//!    reported SOCKS endpoint and fetches a captcha challenge.
//! 3. Shows the captcha to the user and submits their solution together
//!    with the opaque challenge token.
//! 4. Hands the returned bridge lines to the preference store and marks
//!    bridge mode enabled.

/// Application layer: the protocol client, the state machine, and the
/// trait seams its collaborators plug into.
pub mod application;

/// Infrastructure layer: SOCKS HTTP transport, network-control adapters,
/// storage, and the UI bridge.
pub mod infrastructure;
