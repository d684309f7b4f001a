//! Proxy-bound HTTP channel.
//!
//! Every account talks to the game through its own proxy. `ProxyClient`
//! owns a `reqwest::Client` routed through that proxy with the fixed
//! channel timeout, and can ask an IP echo service which public address
//! the proxy exits from (diagnostics only).

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Proxy, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{ClickerError, ProxyEndpoint};

/// Response shape of `api.ipify.org?format=json`.
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    ip: String,
}

/// Result of asking the IP echo service through a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicIp {
    Resolved(String),
    /// The lookup answered, but not with 200.
    Unknown,
    /// The lookup could not be completed.
    Error,
}

impl fmt::Display for PublicIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicIp::Resolved(ip) => f.write_str(ip),
            PublicIp::Unknown => f.write_str("Unknown"),
            PublicIp::Error => f.write_str("Error"),
        }
    }
}

/// An HTTP client bound to a single proxy endpoint.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    endpoint: ProxyEndpoint,
    http: Client,
}

impl ProxyClient {
    /// Build a client that routes every request through `endpoint`.
    ///
    /// Fails with [`ClickerError::Config`] when the proxy URI is invalid.
    pub fn new(endpoint: ProxyEndpoint, timeout: Duration) -> Result<Self, ClickerError> {
        let proxy = Proxy::all(endpoint.address()).map_err(|e| {
            ClickerError::Config(format!("invalid proxy '{endpoint}': {e}"))
        })?;

        let http = Client::builder()
            .timeout(timeout)
            .proxy(proxy)
            .build()
            .map_err(|e| ClickerError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &ProxyEndpoint {
        &self.endpoint
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Ask `lookup_url` for the proxy's exit address.
    ///
    /// `Ok(None)` means the service answered with something other than 200.
    pub async fn lookup_public_ip(&self, lookup_url: &str) -> Result<Option<String>, ClickerError> {
        let resp = self
            .http
            .get(lookup_url)
            .send()
            .await
            .map_err(|e| ClickerError::ProxyResolution(format!("{}: {e}", self.endpoint)))?;

        if resp.status() != StatusCode::OK {
            debug!(proxy = %self.endpoint, status = %resp.status(), "IP lookup not OK");
            return Ok(None);
        }

        let body: IpLookupResponse = resp
            .json()
            .await
            .map_err(|e| ClickerError::ProxyResolution(format!("{}: {e}", self.endpoint)))?;

        Ok(Some(body.ip))
    }

    /// Like [`lookup_public_ip`](Self::lookup_public_ip) but never fails:
    /// a non-200 answer yields `Unknown` and any failure `Error`.
    pub async fn public_ip(&self, lookup_url: &str) -> PublicIp {
        match self.lookup_public_ip(lookup_url).await {
            Ok(Some(ip)) => PublicIp::Resolved(ip),
            Ok(None) => PublicIp::Unknown,
            Err(e) => {
                warn!(error = %e, "Failed to check proxy IP");
                PublicIp::Error
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
