//! Standalone processor binary. Thin wrapper around the library entry
//! point so a vertex pod can run this image directly; the workspace's
//! unified CLI calls the same [`numaflow_processor::bootstrap`].

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    let (_processor_env, _wiring) = numaflow_processor::bootstrap().await?;
    Ok(())
}
