//! Gluetun control server client
//!
//! Every call is a single GET with a hard timeout. There are no retries: a
//! failed call is final for the refresh cycle that issued it.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::fmt::Display;
use std::time::Duration;

pub const VPN_STATUS_PATH: &str = "/v1/vpn/status";
pub const PUBLIC_IP_PATH: &str = "/v1/publicip/ip";
pub const PORT_FORWARD_PATH: &str = "/v1/portforward";

/// Why an upstream call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCause {
    /// Connection refused, DNS failure, timeout and other transport problems
    Transport(String),
    /// Gateway answered with a non-2xx status code
    Status(u16),
    /// Body could not be read or is not the JSON we expected
    Body(String),
}

impl Display for UpstreamCause {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UpstreamCause::Transport(msg) => msg.fmt(fmt),
            UpstreamCause::Status(code) => write!(fmt, "HTTP status {}", code),
            UpstreamCause::Body(msg) => write!(fmt, "invalid response body: {}", msg),
        }
    }
}

/// A failed GET against the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub path: String,
    pub cause: UpstreamCause,
}

impl UpstreamError {
    pub fn new(path: &str, cause: UpstreamCause) -> Self {
        Self {
            path: path.to_string(),
            cause,
        }
    }
}

impl std::error::Error for UpstreamError {}

impl Display for UpstreamError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "GET {}: {}", self.path, self.cause)
    }
}

/// Source of gateway facts
#[async_trait]
pub trait Upstream: Send + Sync {
    /// GET `path` relative to the gateway base URL and decode the JSON body
    async fn fetch_json(&self, path: &str) -> Result<Value, UpstreamError>;
}

/// HTTP client for the Gluetun control server
#[derive(Debug, Clone)]
pub struct GluetunClient {
    base_url: String,
    timeout: Duration,
}

impl GluetunClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Upstream for GluetunClient {
    async fn fetch_json(&self, path: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let timeout = self.timeout;

        // ureq blocks, keep it off the runtime workers
        let result = tokio::task::spawn_blocking(move || get_json(&url, timeout)).await;
        match result {
            Ok(body) => body.map_err(|cause| UpstreamError::new(path, cause)),
            Err(e) => Err(UpstreamError::new(
                path,
                UpstreamCause::Transport(format!("request task failed: {}", e)),
            )),
        }
    }
}

/// Blocking GET returning the decoded JSON body
pub(crate) fn get_json(url: &str, timeout: Duration) -> Result<Value, UpstreamCause> {
    let response = match ureq::get(url).timeout(timeout).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => return Err(UpstreamCause::Status(code)),
        Err(ureq::Error::Transport(t)) => return Err(UpstreamCause::Transport(t.to_string())),
    };

    let body = response
        .into_string()
        .map_err(|e| UpstreamCause::Body(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| UpstreamCause::Body(e.to_string()))
}
