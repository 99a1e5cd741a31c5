//! # HTTP Server
//!
//! - `POST /api/operator` - operator requests
//! - `GET /health` - liveness
//! - `GET /metrics` - Prometheus text exposition

use crate::handlers::{OperatorApi, OperatorRequest, OperatorResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared state of every route.
#[derive(Clone)]
pub struct AppState {
    /// Method dispatcher.
    pub api: Arc<OperatorApi>,
}

async fn operator(
    State(state): State<AppState>,
    Json(request): Json<OperatorRequest>,
) -> Json<OperatorResponse> {
    Json(state.api.handle(request).await)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

async fn metrics() -> Result<String, (StatusCode, String)> {
    swap_telemetry::encode_metrics().map_err(|e| {
        error!("[runtime] Metrics encoding failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// Build the router.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/operator", post(operator))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("[runtime] Operator API listening on {}", listener.local_addr()?);
    axum::serve(listener, routes(state))
        .with_graceful_shutdown(shutdown)
        .await
}
