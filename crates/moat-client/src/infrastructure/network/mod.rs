//! SOCKS-proxied HTTP transport for the MOAT exchange.
//!
//! Every request is routed through the SOCKS endpoint reported by the
//! network-control collaborator; there is deliberately no direct-internet
//! fallback.  If the proxy is unreachable, the exchange fails, it is never
//! retried over a plain connection.  The `socks5h` scheme keeps DNS
//! resolution on the proxy side, so the bridge server's hostname never
//! reaches the local resolver.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use tracing::{debug, warn};

use moat_core::protocol::messages::CONTENT_TYPE_VND_API_JSON;
use moat_core::ProxyEndpoint;

use crate::application::moat_client::{MoatTransport, TransportError};

/// Upper bound on one full exchange.  Proxied round trips are slow; the
/// daemon may still be building circuits when the first request goes out.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP transport whose every request goes through one SOCKS endpoint.
pub struct SocksHttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl SocksHttpTransport {
    /// Builds a transport pinned to the given proxy endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Exchange`] when the proxy URL is invalid
    /// or the underlying client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        endpoint: &ProxyEndpoint,
    ) -> Result<Self, TransportError> {
        let proxy = reqwest::Proxy::all(endpoint.socks_url())
            .map_err(|e| TransportError::Exchange(e.to_string()))?;
        let http = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(EXCHANGE_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Exchange(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl MoatTransport for SocksHttpTransport {
    async fn send(&self, endpoint: &str, body: Value) -> Result<Value, TransportError> {
        let url = self.request_url(endpoint);
        debug!(%url, "issuing proxied MOAT request");

        let bytes =
            serde_json::to_vec(&body).map_err(|e| TransportError::Exchange(e.to_string()))?;
        let response = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE_VND_API_JSON)
            .body(bytes)
            .send()
            .await
            .map_err(|e| TransportError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), %url, "server answered with non-success status");
            // Keep the body when it is readable JSON so the protocol layer
            // can extract a server-supplied error detail.
            let body = response.json::<Value>().await.ok();
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Exchange(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
