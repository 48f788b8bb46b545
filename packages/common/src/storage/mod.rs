mod error;
mod key;
mod traits;

pub mod filesystem;
pub mod memory;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use error::StorageError;
pub use key::{BlobKey, FALLBACK_EXTENSION, THUMBNAIL_PREFIX, upload_extension};
pub use traits::{Blob, BlobReader, BlobStore, BoxReader, reader_from_bytes};

use crate::config::{BlobBackend, BlobStoreConfig};

/// Build the configured blob store backend.
pub async fn from_config(
    config: &BlobStoreConfig,
    max_size: u64,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    tracing::info!(backend = ?config.backend, max_size, "Opening blob store");
    match config.backend {
        BlobBackend::Filesystem => {
            let store = filesystem::FilesystemBlobStore::new(config.path.clone(), max_size).await?;
            Ok(Arc::new(store))
        }
        BlobBackend::Memory => Ok(Arc::new(memory::MemoryBlobStore::new())),
        #[cfg(feature = "object-storage")]
        BlobBackend::S3 => Ok(Arc::new(s3::S3BlobStore::new(&config.s3, max_size)?)),
        #[cfg(not(feature = "object-storage"))]
        BlobBackend::S3 => Err(StorageError::Backend(
            "built without the `object-storage` feature".into(),
        )),
    }
}
