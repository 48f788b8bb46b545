use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::{Blob, BlobReader, BlobStore, reader_from_bytes};

/// Process-local blob store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<BlobKey, Blob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently held.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StorageError {
        StorageError::Backend("memory blob store lock poisoned".into())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &BlobKey,
        data: &[u8],
        content_type: &str,
    ) -> Result<u64, StorageError> {
        let mut blobs = self.blobs.write().map_err(|_| Self::poisoned())?;
        blobs.insert(
            key.clone(),
            Blob {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(data.len() as u64)
    }

    async fn open(&self, key: &BlobKey) -> Result<BlobReader, StorageError> {
        let blob = self.get(key).await?;
        Ok(BlobReader {
            size: blob.data.len() as u64,
            content_type: blob.content_type,
            reader: reader_from_bytes(blob.data),
        })
    }

    async fn get(&self, key: &BlobKey) -> Result<Blob, StorageError> {
        let blobs = self.blobs.read().map_err(|_| Self::poisoned())?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let blobs = self.blobs.read().map_err(|_| Self::poisoned())?;
        Ok(blobs.contains_key(key))
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let mut blobs = self.blobs.write().map_err(|_| Self::poisoned())?;
        Ok(blobs.remove(key).is_some())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
