//! Liveness probe.
//!
//! `GET /healthz` answers `200 OK` while the ready file exists and
//! `503 NOT READY` otherwise. The file is checked on every request, so
//! whatever process owns it can flip readiness by creating or removing it.
//! Every other path is a bare 404.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use ragbridge_config::HealthzConfig;
use tracing::info;

pub const READY_BODY: &str = "OK";
pub const NOT_READY_BODY: &str = "NOT READY";

/// Build the probe router for `ready_file`.
pub fn router(ready_file: impl Into<PathBuf>) -> Router {
    let ready_file = Arc::new(ready_file.into());
    Router::new()
        // Matched on path only; a query string still reaches the handler.
        .route("/healthz", get(healthz_handler))
        .fallback(not_found)
        .with_state(ready_file)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Bind on all interfaces at `config.port` and serve until the task is dropped.
pub async fn serve(config: HealthzConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        ready_file = %config.ready_file.display(),
        "Healthz probe listening"
    );
    axum::serve(listener, router(config.ready_file)).await
}

async fn healthz_handler(State(ready_file): State<Arc<PathBuf>>) -> Response {
    let ready = tokio::fs::try_exists(ready_file.as_path())
        .await
        .unwrap_or(false);

    let (status, body) = if ready {
        (StatusCode::OK, READY_BODY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, NOT_READY_BODY)
    };

    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
