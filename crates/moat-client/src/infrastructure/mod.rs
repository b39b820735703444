//! Infrastructure layer: concrete adapters behind the application seams.
//!
//! - **`network`** – The reqwest-based HTTP transport pinned to the
//!   anonymizing network's SOCKS listener.
//! - **`tor_control`** – Adapters that carry the session's commands to the
//!   network-control collaborator.
//! - **`storage`** – TOML configuration and the file-backed bridge
//!   preference store.
//! - **`ui_bridge`** – Shared state snapshots and DTOs for a hosting UI.

pub mod network;
pub mod storage;
pub mod tor_control;
pub mod ui_bridge;
