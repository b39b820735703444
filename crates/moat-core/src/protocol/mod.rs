//! The MOAT wire protocol: envelope types and the response codec.
//!
//! Both protocol steps POST a JSON body of the shape
//! `{"data":[{"version":"0.1.0", ...}]}` and receive either a success
//! envelope of the same shape or an error envelope
//! `{"errors":[{"detail":"..."}]}`.
//!
//! - **`messages`** – The typed request and response payloads plus the
//!   protocol constants (version string, endpoints, content type).
//! - **`codec`** – Parses success envelopes into domain entities, decodes
//!   the captcha image, and classifies failures, preferring the
//!   server-supplied error detail over the raw cause.

pub mod codec;
pub mod messages;
