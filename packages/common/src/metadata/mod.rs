mod error;
mod traits;

#[cfg(feature = "sea-orm")]
pub mod database;
#[cfg(feature = "sea-orm")]
pub mod entity;
pub mod memory;

use std::sync::Arc;

pub use error::MetadataError;
pub use traits::MetadataStore;

use crate::config::{MetadataBackend, MetadataStoreConfig};

/// Build the configured metadata store backend, creating the schema if needed.
pub async fn from_config(
    config: &MetadataStoreConfig,
) -> Result<Arc<dyn MetadataStore>, MetadataError> {
    tracing::info!(backend = ?config.backend, "Opening metadata store");
    match config.backend {
        MetadataBackend::Memory => Ok(Arc::new(memory::MemoryMetadataStore::new())),
        #[cfg(feature = "sea-orm")]
        MetadataBackend::Database => {
            let store =
                database::DatabaseMetadataStore::connect(&config.url, config.max_connections)
                    .await?;
            store.sync_schema().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sea-orm"))]
        MetadataBackend::Database => Err(MetadataError::Unavailable(
            "built without the `sea-orm` feature".into(),
        )),
    }
}
