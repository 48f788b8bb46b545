use std::sync::Arc;

use anyhow::Context;
use processor::config::ProcessorAppConfig;
use processor::{ThumbnailProcessor, handlers};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = ProcessorAppConfig::load().context("Failed to load config")?;
    for setting in config.storage.missing_settings() {
        warn!(setting, "Missing configuration; the processor may fail at runtime");
    }

    let blobs = common::storage::from_config(&config.storage.blob, config.storage.max_upload_size)
        .await
        .context("Failed to open blob store")?;
    let metadata = common::metadata::from_config(&config.storage.metadata)
        .await
        .context("Failed to open metadata store")?;

    let processor = Arc::new(ThumbnailProcessor::new(
        blobs,
        metadata,
        config.processor.thumbnail_size,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, thumbnail_size = config.processor.thumbnail_size, "Processor listening");

    axum::serve(listener, handlers::router(processor)).await?;
    Ok(())
}
