use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use super::geo::GeoLocator;
use super::upstream::{PORT_FORWARD_PATH, PUBLIC_IP_PATH, Upstream, UpstreamCause, UpstreamError, VPN_STATUS_PATH};
use super::{Location, StatusSnapshot, lenient_port, lenient_string};

/// Builds a fresh [`StatusSnapshot`] from the gateway and the geo fallback
///
/// Each upstream endpoint is its own failure domain: a failed call is
/// recorded in `errors` and never stops the others from being collected.
#[derive(Clone)]
pub struct Aggregator {
    upstream: Arc<dyn Upstream>,
    geo: Arc<dyn GeoLocator>,
}

impl Aggregator {
    pub fn new(upstream: Arc<dyn Upstream>, geo: Arc<dyn GeoLocator>) -> Self {
        Self { upstream, geo }
    }

    /// Run one full refresh cycle. No caching happens here.
    pub async fn refresh(&self) -> StatusSnapshot {
        tracing::debug!("refreshing vpn status");
        let mut snapshot = StatusSnapshot::unknown();

        let (vpn, public_ip, port_forward) = tokio::join!(
            self.upstream.fetch_json(VPN_STATUS_PATH),
            self.upstream.fetch_json(PUBLIC_IP_PATH),
            self.upstream.fetch_json(PORT_FORWARD_PATH),
        );

        // merge in call order so errors stay ordered
        match vpn.and_then(|body| into_object(VPN_STATUS_PATH, body)) {
            Ok(vpn) => snapshot.vpn = vpn,
            Err(e) => record(&mut snapshot, "vpn/status", e),
        }

        match public_ip.and_then(|body| decode::<PublicIpResponse>(PUBLIC_IP_PATH, body)) {
            Ok(body) => {
                snapshot.location = body.location();
                snapshot.public_ip = Some(body.into_ip());
            }
            Err(e) => record(&mut snapshot, "publicip/ip", e),
        }

        match port_forward.and_then(|body| decode::<PortForwardResponse>(PORT_FORWARD_PATH, body)) {
            Ok(body) => snapshot.port_forward = body.port,
            Err(e) => record(&mut snapshot, "portforward", e),
        }

        if snapshot.location.is_empty() {
            if let Some(ip) = snapshot.public_ip().map(str::to_string) {
                tracing::debug!("gateway reported no location, looking up {}", ip);
                snapshot.location = self.geo.lookup(&ip).await;
            }
        }

        tracing::debug!(
            "refresh done: vpn={} public_ip={:?} errors={}",
            snapshot.vpn_status(),
            snapshot.public_ip,
            snapshot.errors.len()
        );
        snapshot
    }
}

fn record(snapshot: &mut StatusSnapshot, label: &str, err: UpstreamError) {
    let message = format!("{}: {}", label, err.cause);
    tracing::warn!("{}", message);
    snapshot.errors.push(message);
}

/// `/v1/publicip/ip` body
///
/// Some gateway builds embed geo fields next to the IP.
#[derive(Deserialize, Debug, Default)]
struct PublicIpResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    public_ip: Option<String>,
    // older gateway builds
    #[serde(default, deserialize_with = "lenient_string")]
    public_ip_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    city: Option<String>,
}

impl PublicIpResponse {
    fn location(&self) -> Location {
        Location {
            country: self.country.clone(),
            region: self.region.clone(),
            city: self.city.clone(),
        }
    }

    /// `public_ip`, or the legacy `public_ip_address`, or empty
    fn into_ip(self) -> String {
        self.public_ip
            .or(self.public_ip_address)
            .unwrap_or_default()
    }
}

/// `/v1/portforward` body
#[derive(Deserialize, Debug, Default)]
struct PortForwardResponse {
    #[serde(default, deserialize_with = "lenient_port")]
    port: Option<u16>,
}

fn into_object(path: &str, body: Value) -> Result<Map<String, Value>, UpstreamError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(UpstreamError::new(
            path,
            UpstreamCause::Body(format!("expected a JSON object, got {}", other)),
        )),
    }
}

/// Decode an object body; arrays and scalars are rejected before serde sees them
fn decode<T: DeserializeOwned>(path: &str, body: Value) -> Result<T, UpstreamError> {
    let map = into_object(path, body)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| UpstreamError::new(path, UpstreamCause::Body(e.to_string())))
}
