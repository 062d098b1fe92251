//! VPN status aggregation pipeline
//!
//! A refresh cycle queries the gateway for its VPN state, public IP and
//! forwarded port, optionally enriches the result with a geolocation lookup
//! and produces one immutable [`StatusSnapshot`]. The [`cache::StatusCache`]
//! sits in front of the [`aggregator::Aggregator`] so repeated polling does
//! not hammer the gateway.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub mod aggregator;
pub mod cache;
pub mod geo;
pub mod upstream;

/// Value reported in `vpn.status` until the gateway tells us otherwise
pub const UNKNOWN_STATUS: &str = "unknown";

/// Gateway status meaning the tunnel is up
pub const RUNNING_STATUS: &str = "running";

/// Aggregated result of one refresh cycle
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Raw body of `/v1/vpn/status`, passed through untouched
    pub vpn: Map<String, Value>,
    /// `None` when the public IP call failed, possibly empty when it succeeded
    pub public_ip: Option<String>,
    pub location: Location,
    pub port_forward: Option<u16>,
    /// One diagnostic per failed upstream call, in call order
    pub errors: Vec<String>,
}

impl StatusSnapshot {
    /// Snapshot before any upstream call has been made
    pub fn unknown() -> Self {
        let mut vpn = Map::new();
        vpn.insert("status".to_string(), Value::String(UNKNOWN_STATUS.to_string()));
        Self {
            vpn,
            public_ip: None,
            location: Location::default(),
            port_forward: None,
            errors: Vec::new(),
        }
    }

    /// The gateway reported VPN state, `"unknown"` if it is missing or not a string
    pub fn vpn_status(&self) -> &str {
        self.vpn
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_STATUS)
    }

    /// Public IP if one is known and non-empty
    pub fn public_ip(&self) -> Option<&str> {
        self.public_ip.as_deref().filter(|ip| !ip.is_empty())
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Geographic location of the public IP
///
/// Serializes only the keys that are known, so an empty location is `{}`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.region.is_none() && self.city.is_none()
    }

    /// "city / region / country" with missing parts skipped
    pub fn display(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

/// Non-empty string field, any other value counts as absent
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Port number field, anything that is not a valid port counts as absent
pub(crate) fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|port| u16::try_from(port).ok()))
}

/// Connected means the tunnel is running and a public IP was observed
pub fn is_connected(snapshot: &StatusSnapshot) -> bool {
    snapshot.vpn_status() == RUNNING_STATUS && snapshot.public_ip().is_some()
}
