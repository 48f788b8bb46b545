use std::path::PathBuf;

use serde::Deserialize;

/// Storage configuration shared by the gallery server and the processor.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Largest accepted upload in bytes. Default: 20 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    #[serde(default)]
    pub blob: BlobStoreConfig,
    #[serde(default)]
    pub metadata: MetadataStoreConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    #[default]
    Filesystem,
    S3,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlobStoreConfig {
    #[serde(default)]
    pub backend: BlobBackend,
    /// Base directory for the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_blob_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub s3: S3Settings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Settings {
    /// Default: "lumina-gallery-images".
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub path_style: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    #[default]
    Database,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetadataStoreConfig {
    #[serde(default)]
    pub backend: MetadataBackend,
    /// Database URL. Default: "sqlite://lumina.db?mode=rwc".
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Connection pool size. Default: 10.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_upload_size() -> u64 {
    20 * 1024 * 1024
}
fn default_blob_path() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_bucket() -> String {
    "lumina-gallery-images".into()
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_database_url() -> String {
    "sqlite://lumina.db?mode=rwc".into()
}
fn default_max_connections() -> u32 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload_size(),
            blob: BlobStoreConfig::default(),
            metadata: MetadataStoreConfig::default(),
        }
    }
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackend::default(),
            path: default_blob_path(),
            s3: S3Settings::default(),
        }
    }
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
        }
    }
}

impl Default for MetadataStoreConfig {
    fn default() -> Self {
        Self {
            backend: MetadataBackend::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl StorageConfig {
    /// Names of settings that are required by the selected backends but unset.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.blob.backend == BlobBackend::S3 {
            let s3 = &self.blob.s3;
            if s3.bucket.trim().is_empty() {
                missing.push("storage.blob.s3.bucket");
            }
            if s3.region.trim().is_empty() {
                missing.push("storage.blob.s3.region");
            }
            if s3.access_key.as_deref().is_none_or(str::is_empty) {
                missing.push("storage.blob.s3.access_key");
            }
            if s3.secret_key.as_deref().is_none_or(str::is_empty) {
                missing.push("storage.blob.s3.secret_key");
            }
        }
        if self.metadata.backend == MetadataBackend::Database && self.metadata.url.trim().is_empty()
        {
            missing.push("storage.metadata.url");
        }
        missing
    }
}
