//! Application layer use cases for the MOAT client.
//!
//! # What use cases does the client have?
//!
//! - **`moat_client`** – The two protocol operations (`fetch_captcha`,
//!   `submit_solution`) over an injected [`moat_client::MoatTransport`]
//!   implementation, including the collapse of transport, parse, and
//!   server-reported failures into a single user-facing error.
//!
//! - **`session`** – The protocol state machine.  It gates the client on
//!   anonymizing-network readiness, sequences the two operations, enforces
//!   the single-outstanding-call rule, and emits terminal results to the
//!   hosting UI.

pub mod moat_client;
pub mod session;
