use common::metadata::MetadataError;
use common::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Blob store error: {0}")]
    Storage(#[from] StorageError),

    #[error("Metadata store error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Thumbnail encode failed: {0}")]
    Encode(String),

    #[error("Processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
