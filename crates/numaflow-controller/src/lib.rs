//! Pipeline controller library: watches Pipeline custom resources and
//! reconciles their Vertex objects, daemon Deployment/Service, and ISB
//! buffers. Exposed as a library so the workspace's unified CLI can run it
//! as a subcommand as well as this crate's own standalone binary.

pub mod config;
pub mod convert;
pub mod crd;
pub mod errors;
pub mod reconcile;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use futures::StreamExt;
use kube::runtime::{watcher, Controller};
use kube::{Api, Client};
use serde_json::json;
use tracing::{error, info};

pub use config::ControllerConfig;
pub use crd::{Pipeline, Vertex};
pub use reconcile::{error_policy, reconcile, Context};

/// Connect to the cluster, spawn the health server, and run the reconcile
/// loop until shutdown. Returns once the controller's watch streams close.
pub async fn run(config: ControllerConfig) -> Result<(), anyhow::Error> {
    info!(
        namespace = ?config.namespace,
        requeue_secs = config.requeue_secs,
        "starting numaflow pipeline controller"
    );

    let client = Client::try_default().await?;

    let health_addr = SocketAddr::from(([0, 0, 0, 0], config.health_port));
    let health_app = Router::new()
        .route("/healthz", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/readyz", get(|| async { Json(json!({"status": "ok"})) }));

    let health_server = tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(health_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, "failed to bind health server");
                return;
            }
        };
        if let Err(e) = axum::serve(listener, health_app).await {
            error!(error = %e, "health server error");
        }
    });

    let pipelines: Api<Pipeline> = match &config.namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };
    let vertices: Api<Vertex> = match &config.namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    let ctx = Arc::new(Context { client, config });

    Controller::new(pipelines, watcher::Config::default())
        .owns(vertices, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(object) => info!(?object, "reconciled pipeline"),
                Err(e) => error!(error = %e, "reconcile failed"),
            }
        })
        .await;

    health_server.abort();
    info!("controller shutdown complete");
    Ok(())
}
