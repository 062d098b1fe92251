//! HTTP request handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
};
use std::sync::Arc;
use crate::status::cache::StatusCache;
use crate::status::{StatusSnapshot, is_connected};
use super::models::HealthResponse;
use super::render;

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct AppState {
    cache: Arc<StatusCache>,
}

impl AppState {
    pub fn new(cache: Arc<StatusCache>) -> Self {
        Self { cache }
    }
}

/// Full status snapshot, always 200
pub async fn status(State(state): State<AppState>) -> Json<Arc<StatusSnapshot>> {
    Json(state.cache.get().await)
}

/// Health check endpoint, 503 unless the VPN is connected
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let snapshot = state.cache.get().await;
    if is_connected(&snapshot) {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                ok: true,
                vpn: snapshot.vpn.clone(),
                public_ip: snapshot.public_ip.clone(),
                errors: None,
            }),
        );
    }

    tracing::debug!("health check failing: vpn={}", snapshot.vpn_status());
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthResponse {
            ok: false,
            vpn: snapshot.vpn.clone(),
            public_ip: snapshot.public_ip.clone(),
            errors: Some(snapshot.errors.clone()),
        }),
    )
}

/// Dashboard fragment
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.cache.get().await;
    let connected = is_connected(&snapshot);
    Html(render::dashboard(&snapshot, connected, state.cache.freshness().as_secs()))
}
