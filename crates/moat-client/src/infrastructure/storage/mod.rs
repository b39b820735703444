//! Persistence for the MOAT client.
//!
//! - **`config`** – The TOML configuration file (base URL, proxy endpoint,
//!   log level, storage paths).
//! - **`prefs`** – The file-backed bridge preference store the surrounding
//!   application reads its bridge configuration from.

pub mod config;
pub mod prefs;
