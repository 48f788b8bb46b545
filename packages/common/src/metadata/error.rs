use thiserror::Error;
use uuid::Uuid;

/// Errors raised by metadata store backends.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("image record not found: {0}")]
    NotFound(Uuid),

    #[error("duplicate image id: {0}")]
    Duplicate(Uuid),

    #[error("corrupt image record {id}: {detail}")]
    Corrupt { id: Uuid, detail: String },

    #[cfg(feature = "sea-orm")]
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}
