//! Fallback geolocation lookup
//!
//! Used only when the gateway did not report a location itself. Lookups are
//! best-effort: any failure yields an empty [`Location`].

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use super::Location;
use super::lenient_string;
use super::upstream::get_json;

pub const IP_API_BASE: &str = "http://ip-api.com";

/// Which fallback geolocation provider to use
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GeoLookup {
    /// ip-api.com, keyless
    #[default]
    IpApi,
    /// Never look up
    #[value(name = "none")]
    #[serde(rename = "none")]
    Disabled,
}

/// IP to location resolver that never fails
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Empty location when nothing is known about `ip`
    async fn lookup(&self, ip: &str) -> Location;
}

/// Locator used when lookups are turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

#[async_trait]
impl GeoLocator for NoLookup {
    async fn lookup(&self, _ip: &str) -> Location {
        Location::default()
    }
}

/// ip-api.com JSON endpoint client
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    base_url: String,
    timeout: Duration,
}

impl IpApiLocator {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(IP_API_BASE, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn url(&self, ip: &str) -> String {
        format!(
            "{}/json/{}?fields=status,country,regionName,city,query",
            self.base_url, ip
        )
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn lookup(&self, ip: &str) -> Location {
        if ip.is_empty() {
            return Location::default();
        }

        let url = self.url(ip);
        let timeout = self.timeout;
        match tokio::task::spawn_blocking(move || get_json(&url, timeout)).await {
            Ok(Ok(body)) => parse_ip_api(&body),
            Ok(Err(cause)) => {
                tracing::debug!("geolocation lookup for {} failed: {}", ip, cause);
                Location::default()
            }
            Err(e) => {
                tracing::debug!("geolocation task failed: {}", e);
                Location::default()
            }
        }
    }
}

/// ip-api.com `/json/<ip>` body
#[derive(Deserialize, Debug)]
struct IpApiResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    country: Option<String>,
    #[serde(default, rename = "regionName", deserialize_with = "lenient_string")]
    region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    city: Option<String>,
}

/// Map an ip-api.com body onto our field names
///
/// Anything but `"status": "success"` is treated as no data.
pub fn parse_ip_api(body: &Value) -> Location {
    if !body.is_object() {
        return Location::default();
    }
    match IpApiResponse::deserialize(body) {
        Ok(response) if response.status.as_deref() == Some("success") => Location {
            country: response.country,
            region: response.region,
            city: response.city,
        },
        _ => Location::default(),
    }
}

/// Build the locator selected by configuration
pub fn new_locator(kind: GeoLookup, timeout: Duration) -> Box<dyn GeoLocator> {
    match kind {
        GeoLookup::IpApi => Box::new(IpApiLocator::new(timeout)),
        GeoLookup::Disabled => Box::new(NoLookup),
    }
}
