//! HTTP API response models

use serde::Serialize;
use serde_json::{Map, Value};

/// `/healthz` response body
///
/// `errors` is only reported when the VPN is not connected.
#[derive(Serialize, Debug, Clone)]
pub struct HealthResponse {
    pub ok: bool,
    pub vpn: Map<String, Value>,
    pub public_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}
