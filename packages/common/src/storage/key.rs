use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// Extension used when the uploaded filename carries no usable one.
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Namespace under which processed thumbnails are stored.
pub const THUMBNAIL_PREFIX: &str = "thumbnails/";

const MAX_KEY_LEN: usize = 512;
const MAX_EXTENSION_LEN: usize = 10;

/// A validated blob store key.
///
/// Keys are relative, slash-separated paths made of `[A-Za-z0-9._-]` segments.
/// No segment may be empty or start with a dot, which rules out traversal on
/// the filesystem backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Derive the storage key for a freshly uploaded image: `<id>.<ext>`.
    ///
    /// The extension is the lower-cased suffix of `filename`, or
    /// [`FALLBACK_EXTENSION`] when it is missing or not plain alphanumeric.
    pub fn for_upload(id: Uuid, filename: &str) -> Self {
        let ext = upload_extension(filename);
        Self(format!("{id}.{ext}"))
    }

    /// Parse and validate a key string.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidKey("key is empty".into()));
        }
        if s.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} characters"
            )));
        }
        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(StorageError::InvalidKey(format!(
                    "empty path segment in '{s}'"
                )));
            }
            if segment.starts_with('.') {
                return Err(StorageError::InvalidKey(format!(
                    "segment starting with '.' in '{s}'"
                )));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            {
                return Err(StorageError::InvalidKey(format!(
                    "invalid characters in '{s}'"
                )));
            }
        }
        Ok(Self(s.to_string()))
    }

    /// Key of the thumbnail derived from this blob.
    pub fn thumbnail(&self) -> Self {
        Self(format!("{THUMBNAIL_PREFIX}{}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments of the key, for filesystem layout.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

/// Lower-cased extension of an uploaded filename, or the fallback.
pub fn upload_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BlobKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BlobKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
