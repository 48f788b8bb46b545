use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::BlobKey;

/// Metadata of one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    /// Client-supplied filename, stored verbatim.
    pub filename: String,
    pub blob_key: BlobKey,
    /// Byte length counted while receiving the upload.
    pub file_size: u64,
    /// Declared MIME type of the upload.
    pub file_type: String,
    pub uploader: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail_key: Option<BlobKey>,
    #[serde(default)]
    pub processed: bool,
}

/// Fields written back by the thumbnail processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub width: u32,
    pub height: u32,
    pub thumbnail_key: BlobKey,
}

impl ImageRecord {
    /// Public path of the original image content.
    pub fn file_url(&self) -> String {
        file_url(self.id)
    }

    /// Public path of the thumbnail, once one has been generated.
    pub fn thumbnail_url(&self) -> Option<String> {
        self.thumbnail_key
            .as_ref()
            .map(|_| format!("/api/images/{}/thumbnail", self.id))
    }

    /// True if any of `wanted` is among this record's tags.
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        wanted.iter().any(|tag| self.tags.contains(tag))
    }

    pub fn apply_processing(&mut self, result: &ProcessingResult) {
        self.width = Some(result.width);
        self.height = Some(result.height);
        self.thumbnail_key = Some(result.thumbnail_key.clone());
        self.processed = true;
    }
}

pub fn file_url(id: Uuid) -> String {
    format!("/api/images/{id}/file")
}

/// Split a comma-separated tag string into trimmed, non-empty tags, keeping order.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
