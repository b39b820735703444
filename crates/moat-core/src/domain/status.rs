//! Anonymizing-network status and the SOCKS proxy endpoint it reports.
//!
//! The network-control collaborator (the daemon that manages the anonymizing
//! network) broadcasts readiness notifications carrying a status string and,
//! once running, the host and port of its local SOCKS listener.  The MOAT
//! protocol is only usable while the status is [`TorStatus::On`], because
//! every request must be routed through that listener.

use serde::{Deserialize, Serialize};

/// Host used when a readiness notification omits the proxy host.
pub const DEFAULT_SOCKS_HOST: &str = "127.0.0.1";

/// Port used when a readiness notification omits the proxy port.
///
/// 9050 is the conventional local SOCKS listener port of the daemon.
pub const DEFAULT_SOCKS_PORT: u16 = 9050;

/// Lifecycle status of the anonymizing network, as reported by the
/// network-control collaborator.
///
/// Drives which action the protocol state machine takes next.  Consumed
/// read-only; the client never sets this itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorStatus {
    /// The network is not running.
    Off,
    /// The network is bootstrapping; not yet usable.
    Starting,
    /// The network is up and the SOCKS listener accepts connections.
    On,
    /// The collaborator sent a status the client does not recognise.
    Unknown,
}

impl TorStatus {
    /// Parses the status string carried by a readiness notification.
    ///
    /// An absent or empty status is treated as `Off`, matching the
    /// collaborator's convention of omitting the extra before the daemon
    /// has ever started.  Anything unrecognised maps to `Unknown`, which
    /// the state machine treats as a re-poll condition, never an error.
    pub fn from_signal(raw: &str) -> Self {
        match raw {
            "" | "OFF" => Self::Off,
            "STARTING" => Self::Starting,
            "ON" => Self::On,
            _ => Self::Unknown,
        }
    }
}

/// The local SOCKS listener through which all MOAT traffic must be routed.
///
/// Only meaningful while [`TorStatus::On`]; constructing an HTTP transport
/// from an endpoint observed under any other status is a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    /// Proxy host, usually the loopback address.
    pub host: String,
    /// Proxy port, 1 to 65535.
    pub port: u16,
}

impl ProxyEndpoint {
    /// Creates an endpoint from an explicit host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Renders the endpoint as a `socks5h://` proxy URL.
    ///
    /// The `h` variant resolves hostnames on the proxy side, so the bridge
    /// server's DNS name never leaks to the local resolver.
    pub fn socks_url(&self) -> String {
        format!("socks5h://{}:{}", self.host, self.port)
    }
}

impl Default for ProxyEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKS_HOST, DEFAULT_SOCKS_PORT)
    }
}

/// A readiness notification from the network-control collaborator.
///
/// Host and port are optional because the collaborator only knows them once
/// the SOCKS listener is bound; [`StatusEvent::endpoint`] applies the
/// documented defaults for absent or nonsensical values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Proxy host, when the notification carried one.
    pub host: Option<String>,
    /// Proxy port, when the notification carried one.
    pub port: Option<u16>,
    /// Parsed network status.
    pub status: TorStatus,
}

impl StatusEvent {
    /// Builds a notification with neither host nor port, status only.
    pub fn status_only(status: TorStatus) -> Self {
        Self { host: None, port: None, status }
    }

    /// Resolves the proxy endpoint this notification describes.
    ///
    /// An absent or empty host falls back to [`DEFAULT_SOCKS_HOST`]; an
    /// absent or zero port falls back to [`DEFAULT_SOCKS_PORT`].
    pub fn endpoint(&self) -> ProxyEndpoint {
        let host = match self.host.as_deref() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => DEFAULT_SOCKS_HOST.to_string(),
        };
        let port = match self.port {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_SOCKS_PORT,
        };
        ProxyEndpoint::new(host, port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
