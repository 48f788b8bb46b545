//! One-way dispatch of processing requests to the thumbnail processor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::processing::ProcessRequest;
use processor::{ProcessorError, ThumbnailProcessor};
use thiserror::Error;

use crate::config::{ProcessorConfig, ProcessorMode};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("processor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("processor responded {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error(transparent)]
    Processing(#[from] ProcessorError),
    #[error("processor target is not configured")]
    MissingTarget,
}

/// Hands a freshly uploaded image to the thumbnail processor.
///
/// Callers run this detached and only log failures.
#[async_trait]
pub trait ProcessorNotifier: Send + Sync {
    async fn notify(&self, request: ProcessRequest) -> Result<(), NotifyError>;
}

/// Runs the processor in this process.
pub struct LocalNotifier {
    processor: Arc<ThumbnailProcessor>,
}

impl LocalNotifier {
    pub fn new(processor: Arc<ThumbnailProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl ProcessorNotifier for LocalNotifier {
    async fn notify(&self, request: ProcessRequest) -> Result<(), NotifyError> {
        self.processor.process(&request).await?;
        Ok(())
    }
}

/// POSTs the request as JSON to a processor endpoint.
pub struct HttpNotifier {
    client: reqwest::Client,
    target: String,
}

impl HttpNotifier {
    pub fn new(target: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            target: target.into(),
        })
    }
}

#[async_trait]
impl ProcessorNotifier for HttpNotifier {
    async fn notify(&self, request: ProcessRequest) -> Result<(), NotifyError> {
        let res = self.client.post(&self.target).json(&request).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Drops every request.
pub struct DisabledNotifier;

#[async_trait]
impl ProcessorNotifier for DisabledNotifier {
    async fn notify(&self, request: ProcessRequest) -> Result<(), NotifyError> {
        tracing::debug!(image_id = %request.image_id, "Processing disabled; request dropped");
        Ok(())
    }
}

/// Build the notifier selected by `processor.mode`.
///
/// `local` mode needs the processor built over the same stores as the gallery.
pub fn from_config(
    config: &ProcessorConfig,
    local: impl FnOnce() -> Arc<ThumbnailProcessor>,
) -> Result<Arc<dyn ProcessorNotifier>, NotifyError> {
    tracing::info!(mode = ?config.mode, "Configuring thumbnail processor");
    Ok(match config.mode {
        ProcessorMode::Local => Arc::new(LocalNotifier::new(local())),
        ProcessorMode::Http => {
            let target = config
                .target
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .ok_or(NotifyError::MissingTarget)?;
            Arc::new(HttpNotifier::new(target)?)
        }
        ProcessorMode::Disabled => Arc::new(DisabledNotifier),
    })
}
