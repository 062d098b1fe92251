//! HTTP server setup and management

use axum::{
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use super::handlers::{AppState, health, index, status};

/// Routes exposed by the dashboard
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status))
        .route("/healthz", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the HTTP server, returns once a shutdown signal is received
pub async fn start(addr: &str, app_state: AppState) -> crate::Result<()> {
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP status server listening on http://{}/", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
