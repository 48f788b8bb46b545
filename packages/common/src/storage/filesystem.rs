use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::BufReader;

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::{BlobReader, BlobStore};

const META_DIR: &str = ".meta";
const TMP_DIR: &str = ".tmp";

/// Sidecar attributes stored next to each blob.
#[derive(Debug, Serialize, Deserialize)]
struct BlobAttributes {
    content_type: String,
    size: u64,
}

/// Filesystem-backed blob store.
///
/// Blob bytes live at `{base_path}/{key}` and their attributes at
/// `{base_path}/.meta/{key}.json`. Writes go through `{base_path}/.tmp` and are
/// renamed into place, so readers never observe a partial blob.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(TMP_DIR)).await?;
        fs::create_dir_all(base_path.join(META_DIR)).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        key.segments()
            .fold(self.base_path.clone(), |path, segment| path.join(segment))
    }

    fn meta_path(&self, key: &BlobKey) -> PathBuf {
        self.base_path
            .join(META_DIR)
            .join(format!("{}.json", key.as_str()))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(TMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_atomic(&self, target: &PathBuf, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        let written = match fs::write(&temp_path, data).await {
            Ok(()) => fs::rename(&temp_path, target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_attributes(&self, key: &BlobKey) -> Result<BlobAttributes, StorageError> {
        match fs::read(self.meta_path(key)).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(
        &self,
        key: &BlobKey,
        data: &[u8],
        content_type: &str,
    ) -> Result<u64, StorageError> {
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let attributes = serde_json::to_vec(&BlobAttributes {
            content_type: content_type.to_string(),
            size,
        })?;

        let blob_path = self.blob_path(key);
        self.write_atomic(&blob_path, data).await?;

        // A blob without attributes cannot be opened; don't leave one behind.
        if let Err(e) = self.write_atomic(&self.meta_path(key), &attributes).await {
            let _ = fs::remove_file(&blob_path).await;
            return Err(e);
        }

        Ok(size)
    }

    async fn open(&self, key: &BlobKey) -> Result<BlobReader, StorageError> {
        let attributes = self.read_attributes(key).await?;
        match fs::File::open(self.blob_path(key)).await {
            Ok(file) => Ok(BlobReader {
                reader: Box::new(BufReader::new(file)),
                content_type: attributes.content_type,
                size: attributes.size,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(key)).await?)
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let _ = fs::remove_file(self.meta_path(key)).await;
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.base_path.display().to_string()
    }
}
