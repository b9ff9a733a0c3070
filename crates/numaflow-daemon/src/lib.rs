//! Pipeline daemon library: exposes health/readiness and aggregated
//! pipeline metrics over HTTP for `kubectl`/UI consumption. Exposed as a
//! library so the workspace's unified CLI can run it as a subcommand as
//! well as this crate's own standalone binary.

pub mod config;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use config::DaemonConfig;

struct DaemonState {
    config: DaemonConfig,
    ready: AtomicBool,
}

/// Bind and serve the daemon's HTTP API until the process is killed.
pub async fn run(config: DaemonConfig) -> Result<(), anyhow::Error> {
    info!(pipeline = %config.pipeline_name, addr = %config.bind_addr(), "starting pipeline daemon");

    let state = Arc::new(DaemonState { config: config.clone(), ready: AtomicBool::new(true) });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/v1/pipelines/:pipeline/vertices/:vertex/metrics", get(vertex_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    axum::serve(listener, app).await.map_err(|e| {
        error!(error = %e, "daemon server error");
        anyhow::anyhow!(e)
    })
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readyz(State(state): State<Arc<DaemonState>>) -> Json<serde_json::Value> {
    let ready = state.ready.load(Ordering::Relaxed);
    Json(json!({ "status": if ready { "ready" } else { "not_ready" } }))
}

/// Per-vertex metrics: buffer pending count and processing rate. Wired to
/// the ISB lifecycle/read-side adapters once a pipeline's buffers are
/// reachable from the daemon process; returns zeroed placeholders until
/// that plumbing lands.
async fn vertex_metrics(
    State(state): State<Arc<DaemonState>>,
    Path((pipeline, vertex)): Path<(String, String)>,
) -> Json<serde_json::Value> {
    Json(json!({
        "pipeline": pipeline,
        "vertex": vertex,
        "configured_pipeline": state.config.pipeline_name,
        "pending": 0,
        "processing_rate": 0.0,
    }))
}
