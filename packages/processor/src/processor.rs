use std::sync::Arc;

use common::metadata::MetadataStore;
use common::processing::{ProcessOutcome, ProcessRequest};
use common::storage::BlobStore;
use common::ProcessingResult;
use tracing::{info, instrument, warn};

use crate::error::ProcessorError;
use crate::thumbnail::render_thumbnail;

/// Derives dimensions and a thumbnail for an uploaded image and patches its record.
pub struct ThumbnailProcessor {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    thumbnail_size: u32,
}

impl ThumbnailProcessor {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        thumbnail_size: u32,
    ) -> Self {
        Self {
            blobs,
            metadata,
            thumbnail_size,
        }
    }

    #[instrument(skip(self, request), fields(image_id = %request.image_id, blob_key = %request.blob_key))]
    pub async fn process(&self, request: &ProcessRequest) -> Result<ProcessOutcome, ProcessorError> {
        if request.image_id.is_nil() {
            return Err(ProcessorError::InvalidRequest("image_id must not be nil".into()));
        }
        if request.blob_location != self.blobs.location() {
            warn!(
                requested = %request.blob_location,
                configured = %self.blobs.location(),
                "Blob location differs from the configured store; reading from the configured store"
            );
        }

        let source = self.blobs.get(&request.blob_key).await?;

        let max_dim = self.thumbnail_size;
        let thumb =
            tokio::task::spawn_blocking(move || render_thumbnail(&source.data, max_dim)).await??;

        let thumbnail_key = request.blob_key.thumbnail();
        self.blobs
            .put(&thumbnail_key, &thumb.data, thumb.content_type)
            .await?;

        let result = ProcessingResult {
            width: thumb.source_width,
            height: thumb.source_height,
            thumbnail_key: thumbnail_key.clone(),
        };
        if let Err(e) = self
            .metadata
            .record_processing(request.image_id, &result)
            .await
        {
            // Record gone or unwritable: drop the orphaned thumbnail.
            let _ = self.blobs.delete(&thumbnail_key).await;
            return Err(e.into());
        }

        info!(
            width = thumb.source_width,
            height = thumb.source_height,
            thumbnail_width = thumb.width,
            thumbnail_height = thumb.height,
            "Image processed"
        );

        Ok(ProcessOutcome {
            image_id: request.image_id,
            width: thumb.source_width,
            height: thumb.source_height,
            thumbnail_key,
        })
    }
}
