use async_trait::async_trait;
use uuid::Uuid;

use super::error::MetadataError;
use crate::filter::ImageFilter;
use crate::record::{ImageRecord, ProcessingResult};

/// Durable store of image records keyed by id.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new record. Fails with [`MetadataError::Duplicate`] if the id exists.
    async fn insert(&self, record: &ImageRecord) -> Result<(), MetadataError>;

    /// Point lookup by id.
    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>, MetadataError>;

    /// Records matching `filter`, newest `upload_date` first, at most `limit`.
    async fn query(
        &self,
        filter: &ImageFilter,
        limit: usize,
    ) -> Result<Vec<ImageRecord>, MetadataError>;

    /// Patch the processing fields of an existing record.
    async fn record_processing(
        &self,
        id: Uuid,
        result: &ProcessingResult,
    ) -> Result<(), MetadataError>;

    /// Delete a record. Returns `false` if no record had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, MetadataError>;
}
