/// Integration tests for the dashboard HTTP surface
///
/// The router is driven in-process with `tower::ServiceExt::oneshot`, backed
/// by scripted gateway and geolocation fakes.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use gluetun_status::http::server::router;
use gluetun_status::http::AppState;
use gluetun_status::status::aggregator::Aggregator;
use gluetun_status::status::cache::StatusCache;
use gluetun_status::status::geo::GeoLocator;
use gluetun_status::status::upstream::{Upstream, UpstreamCause, UpstreamError};
use gluetun_status::status::Location;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Helper: gateway fake answering from a fixed table
struct ScriptedGateway {
    vpn: Result<Value, UpstreamCause>,
    public_ip: Result<Value, UpstreamCause>,
    port_forward: Result<Value, UpstreamCause>,
    calls: AtomicUsize,
}

#[async_trait]
impl Upstream for ScriptedGateway {
    async fn fetch_json(&self, path: &str) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match path {
            "/v1/vpn/status" => self.vpn.clone(),
            "/v1/publicip/ip" => self.public_ip.clone(),
            "/v1/portforward" => self.port_forward.clone(),
            _ => Err(UpstreamCause::Status(404)),
        };
        result.map_err(|cause| UpstreamError::new(path, cause))
    }
}

struct FixedGeo(Location);

#[async_trait]
impl GeoLocator for FixedGeo {
    async fn lookup(&self, _ip: &str) -> Location {
        self.0.clone()
    }
}

fn amsterdam() -> Location {
    Location {
        country: Some("Netherlands".to_string()),
        region: Some("North Holland".to_string()),
        city: Some("Amsterdam".to_string()),
    }
}

fn healthy_gateway() -> ScriptedGateway {
    ScriptedGateway {
        vpn: Ok(json!({"status": "running"})),
        public_ip: Ok(json!({"public_ip": "1.2.3.4"})),
        port_forward: Ok(json!({"port": 51413})),
        calls: AtomicUsize::new(0),
    }
}

fn app(gateway: Arc<ScriptedGateway>, location: Location) -> Router {
    let aggregator = Aggregator::new(gateway, Arc::new(FixedGeo(location)));
    let cache = StatusCache::new(aggregator, Duration::from_secs(15));
    router(AppState::new(Arc::new(cache)))
}

/// Helper: GET `uri`, returns status and raw body
async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_status_and_health_when_connected() {
    let app = app(Arc::new(healthy_gateway()), amsterdam());

    let (status, body) = get_json(&app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "vpn": {"status": "running"},
            "public_ip": "1.2.3.4",
            "location": {"country": "Netherlands", "region": "North Holland", "city": "Amsterdam"},
            "port_forward": 51413,
            "errors": [],
        })
    );

    let (status, body) = get_json(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"ok": true, "vpn": {"status": "running"}, "public_ip": "1.2.3.4"})
    );
}

#[tokio::test]
async fn test_health_fails_when_vpn_status_times_out() {
    let gateway = ScriptedGateway {
        vpn: Err(UpstreamCause::Transport("timed out reading response".to_string())),
        public_ip: Ok(json!({"public_ip": ""})),
        ..healthy_gateway()
    };
    let app = app(Arc::new(gateway), amsterdam());

    let (status, body) = get_json(&app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({
            "ok": false,
            "vpn": {"status": "unknown"},
            "public_ip": "",
            "errors": ["vpn/status: timed out reading response"],
        })
    );

    // degraded data is still served with 200
    let (status, body) = get_json(&app, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], json!({}));
    assert_eq!(body["port_forward"], json!(51413));
}

#[tokio::test]
async fn test_requests_within_window_share_one_refresh() {
    let gateway = Arc::new(healthy_gateway());
    let app = app(gateway.clone(), Location::default());

    let (_, first) = get(&app, "/api/status").await;
    let (_, second) = get(&app, "/api/status").await;
    get(&app, "/healthz").await;
    get(&app, "/").await;

    assert_eq!(first, second);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_dashboard_renders_snapshot() {
    let app = app(Arc::new(healthy_gateway()), amsterdam());

    let (status, body) = get(&app, "/").await;
    let html = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("VPN: running"));
    assert!(html.contains("Amsterdam / North Holland / Netherlands"));
    assert!(html.contains("51413"));
    assert!(html.contains("Cache: 15s"));
}

#[tokio::test]
async fn test_dashboard_is_200_when_gateway_down() {
    let down = || Err(UpstreamCause::Transport("connection refused".to_string()));
    let gateway = ScriptedGateway {
        vpn: down(),
        public_ip: down(),
        port_forward: down(),
        calls: AtomicUsize::new(0),
    };
    let app = app(Arc::new(gateway), amsterdam());

    let (status, body) = get(&app, "/").await;
    let html = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Disconnected"));
    assert!(html.contains("portforward: connection refused"));
}
