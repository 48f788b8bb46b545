use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::{Blob, BlobReader, BlobStore, reader_from_bytes};
use crate::config::S3Settings;

/// S3-compatible object storage backend.
///
/// Works against AWS S3 as well as MinIO-style endpoints when
/// `path_style` is enabled.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(settings: &S3Settings, max_size: u64) -> Result<Self, StorageError> {
        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            settings.access_key.as_deref(),
            settings.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&settings.bucket, region, credentials)?;
        if settings.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket, max_size })
    }
}

fn check_status(status: u16, key: &BlobKey) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        other => Err(StorageError::Backend(format!(
            "unexpected status {other} for '{key}'"
        ))),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
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

        let response = self
            .bucket
            .put_object_with_content_type(key.as_str(), data, content_type)
            .await?;
        check_status(response.status_code(), key)?;
        Ok(size)
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
        let response = self.bucket.get_object(key.as_str()).await?;
        check_status(response.status_code(), key)?;

        let content_type = response
            .headers()
            .get("content-type")
            .cloned()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(Blob {
            data: response.bytes().to_vec(),
            content_type,
        })
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let (_, status) = self.bucket.head_object(key.as_str()).await?;
        match check_status(status, key) {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError> {
        // S3 answers 204 whether or not the object existed.
        let existed = self.exists(key).await?;
        if !existed {
            return Ok(false);
        }
        let response = self.bucket.delete_object(key.as_str()).await?;
        check_status(response.status_code(), key)?;
        Ok(true)
    }

    fn location(&self) -> String {
        self.bucket.name()
    }
}
