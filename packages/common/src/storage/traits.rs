use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::key::BlobKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A fully buffered blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// An open blob, read lazily.
pub struct BlobReader {
    pub reader: BoxReader,
    pub content_type: String,
    /// Stored size in bytes.
    pub size: u64,
}

/// Key-addressed blob storage with a content-type attribute per blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, replacing any existing blob.
    ///
    /// Returns the number of bytes written.
    async fn put(&self, key: &BlobKey, data: &[u8], content_type: &str)
    -> Result<u64, StorageError>;

    /// Open a blob for streaming.
    async fn open(&self, key: &BlobKey) -> Result<BlobReader, StorageError>;

    /// Retrieve all bytes for a blob together with its content type.
    async fn get(&self, key: &BlobKey) -> Result<Blob, StorageError> {
        let mut blob = self.open(key).await?;
        let mut data = Vec::new();
        blob.reader.read_to_end(&mut data).await?;
        Ok(Blob {
            data,
            content_type: blob.content_type,
        })
    }

    /// Check whether a blob exists.
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Where this store keeps its blobs (bucket name, base directory).
    ///
    /// Passed to the thumbnail processor alongside the key.
    fn location(&self) -> String;
}

/// Wrap an in-memory buffer as a [`BoxReader`].
pub fn reader_from_bytes(data: Vec<u8>) -> BoxReader {
    Box::new(Cursor::new(data))
}
