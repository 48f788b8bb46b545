use std::sync::Arc;

use anyhow::Context;
use processor::ThumbnailProcessor;
use server::config::AppConfig;
use server::notifier;
use server::service::GalleryService;
use server::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;
    for setting in config.missing_settings() {
        warn!(setting, "Missing configuration; requests using it will fail");
    }

    let blobs = common::storage::from_config(&config.storage.blob, config.storage.max_upload_size)
        .await
        .context("Failed to open blob store")?;
    let metadata = common::metadata::from_config(&config.storage.metadata)
        .await
        .context("Failed to open metadata store")?;

    let notifier = notifier::from_config(&config.processor, || {
        Arc::new(ThumbnailProcessor::new(
            blobs.clone(),
            metadata.clone(),
            config.processor.thumbnail_size,
        ))
    })
    .context("Failed to configure thumbnail processor")?;

    let gallery = GalleryService::new(
        blobs,
        metadata,
        notifier,
        config.gallery.max_list_results,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        gallery: Arc::new(gallery),
        config,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Lumina gallery listening");

    axum::serve(listener, app).await?;
    Ok(())
}
