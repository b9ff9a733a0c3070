//! Standalone controller binary. Thin wrapper around the library entry
//! point so the reconciler can also ship as its own container image; the
//! workspace's unified CLI calls the same [`numaflow_controller::run`].

use numaflow_controller::ControllerConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = ControllerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    numaflow_controller::run(config).await
}
