//! Gallery orchestration over the blob and metadata stores.
//!
//! Upload writes the blob before the record and rolls the blob back when the
//! record cannot be written. Delete removes blobs first and the record last.

use std::sync::Arc;

use chrono::Utc;
use common::filter::FilterError;
use common::metadata::{MetadataError, MetadataStore};
use common::processing::ProcessRequest;
use common::record::split_tags;
use common::storage::{BlobKey, BlobReader, BlobStore, StorageError};
use common::{ImageFilter, ImageRecord};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::notifier::ProcessorNotifier;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("image {0} not found")]
    NotFound(Uuid),
    #[error("blob write failed: {0}")]
    UploadFailed(#[source] StorageError),
    #[error("metadata write failed: {0}")]
    MetadataWriteFailed(#[source] MetadataError),
    #[error("blob read failed: {0}")]
    DownloadFailed(#[source] StorageError),
    #[error("metadata delete failed: {0}")]
    DeleteFailed(#[source] MetadataError),
    #[error("metadata read failed: {0}")]
    MetadataRead(#[from] MetadataError),
}

impl From<FilterError> for GalleryError {
    fn from(err: FilterError) -> Self {
        GalleryError::InvalidRequest(err.to_string())
    }
}

/// A file received from a client, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct NewImage {
    /// Present when the form carried a `file` part.
    pub file: Option<UploadedFile>,
    pub uploader: Option<String>,
    /// Raw comma-separated tags.
    pub tags: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

pub struct GalleryService {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    notifier: Arc<dyn ProcessorNotifier>,
    max_list_results: usize,
}

impl GalleryService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        notifier: Arc<dyn ProcessorNotifier>,
        max_list_results: usize,
    ) -> Self {
        Self {
            blobs,
            metadata,
            notifier,
            max_list_results,
        }
    }

    /// Store a new image and its record, then hand it to the processor.
    #[instrument(skip_all)]
    pub async fn upload(&self, image: NewImage) -> Result<ImageRecord, GalleryError> {
        let NewImage {
            file,
            uploader,
            tags,
            description,
        } = image;

        let file = file
            .filter(|f| !f.filename.is_empty())
            .ok_or_else(|| GalleryError::InvalidRequest("No file provided".into()))?;
        let content_type = file
            .content_type
            .filter(|ct| ct.starts_with("image/"))
            .ok_or_else(|| GalleryError::InvalidRequest("Only image files are allowed".into()))?;
        let uploader = uploader
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| GalleryError::InvalidRequest("Uploader name is required".into()))?;

        let id = Uuid::now_v7();
        let blob_key = BlobKey::for_upload(id, &file.filename);

        self.blobs
            .put(&blob_key, &file.data, &content_type)
            .await
            .map_err(GalleryError::UploadFailed)?;

        let record = ImageRecord {
            id,
            filename: file.filename,
            blob_key,
            file_size: file.data.len() as u64,
            file_type: content_type,
            uploader,
            tags: tags.as_deref().map(split_tags).unwrap_or_default(),
            description: description.filter(|d| !d.is_empty()),
            upload_date: Utc::now(),
            width: None,
            height: None,
            thumbnail_key: None,
            processed: false,
        };

        if let Err(e) = self.metadata.insert(&record).await {
            if let Err(cleanup) = self.blobs.delete(&record.blob_key).await {
                warn!(
                    image_id = %id,
                    blob_key = %record.blob_key,
                    error = %cleanup,
                    "Failed to remove blob after metadata write failure"
                );
            }
            return Err(GalleryError::MetadataWriteFailed(e));
        }

        info!(
            image_id = %id,
            file_size = record.file_size,
            uploader = %record.uploader,
            "Image uploaded"
        );

        self.dispatch_processing(&record);
        Ok(record)
    }

    fn dispatch_processing(&self, record: &ImageRecord) {
        let request = ProcessRequest {
            blob_location: self.blobs.location(),
            blob_key: record.blob_key.clone(),
            image_id: record.id,
        };
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let image_id = request.image_id;
            if let Err(e) = notifier.notify(request).await {
                warn!(%image_id, error = %e, "Thumbnail processing failed");
            }
        });
    }

    /// Records matching `filter`, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ImageFilter) -> Result<Vec<ImageRecord>, GalleryError> {
        Ok(self.metadata.query(filter, self.max_list_results).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ImageRecord, GalleryError> {
        self.metadata
            .get(id)
            .await?
            .ok_or(GalleryError::NotFound(id))
    }

    /// Open the original content of `record`.
    #[instrument(skip_all, fields(image_id = %record.id))]
    pub async fn open_file(&self, record: &ImageRecord) -> Result<BlobReader, GalleryError> {
        self.blobs
            .open(&record.blob_key)
            .await
            .map_err(GalleryError::DownloadFailed)
    }

    /// Open the generated thumbnail of `record`. Unprocessed images have none.
    #[instrument(skip_all, fields(image_id = %record.id))]
    pub async fn open_thumbnail(&self, record: &ImageRecord) -> Result<BlobReader, GalleryError> {
        let key = record
            .thumbnail_key
            .as_ref()
            .ok_or(GalleryError::NotFound(record.id))?;
        self.blobs
            .open(key)
            .await
            .map_err(GalleryError::DownloadFailed)
    }

    /// Remove an image's blobs and then its record.
    ///
    /// Blob failures are logged and do not stop the record delete.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), GalleryError> {
        let record = self.get(id).await?;

        let keys = std::iter::once(&record.blob_key).chain(record.thumbnail_key.as_ref());
        for key in keys {
            match self.blobs.delete(key).await {
                Ok(true) => {}
                Ok(false) => warn!(image_id = %id, blob_key = %key, "Blob already missing"),
                Err(e) => {
                    warn!(image_id = %id, blob_key = %key, error = %e, "Failed to delete blob")
                }
            }
        }

        match self.metadata.delete(id).await {
            Ok(true) => {
                info!(image_id = %id, "Image deleted");
                Ok(())
            }
            Ok(false) => Err(GalleryError::NotFound(id)),
            Err(e) => Err(GalleryError::DeleteFailed(e)),
        }
    }
}
