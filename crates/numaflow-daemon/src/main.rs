//! Standalone daemon binary. Thin wrapper around the library entry point so
//! the daemon can also ship as its own container image; the workspace's
//! unified CLI calls the same [`numaflow_daemon::run`].

use numaflow_daemon::DaemonConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = DaemonConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    numaflow_daemon::run(config).await
}
