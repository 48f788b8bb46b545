use chrono::{DateTime, Utc};
use common::ImageRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Response DTO for a single image.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageResponse {
    /// Image ID (UUIDv7).
    #[schema(example = "0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f")]
    pub id: Uuid,
    /// Original upload filename.
    #[schema(example = "sunset.png")]
    pub filename: String,
    /// Content size in bytes.
    #[schema(example = 142857)]
    pub file_size: u64,
    /// Declared MIME type.
    #[schema(example = "image/png")]
    pub file_type: String,
    #[schema(example = "alice")]
    pub uploader: String,
    #[schema(example = json!(["nature", "sunset"]))]
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub upload_date: DateTime<Utc>,
    /// Path of the original content.
    #[schema(example = "/api/images/0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f/file")]
    pub url: String,
    /// Whether the thumbnail processor has run.
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "thumbnails/0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f.png")]
    pub thumbnail_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "/api/images/0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f/thumbnail")]
    pub thumbnail_url: Option<String>,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        let url = record.file_url();
        let thumbnail_url = record.thumbnail_url();
        Self {
            id: record.id,
            filename: record.filename,
            file_size: record.file_size,
            file_type: record.file_type,
            uploader: record.uploader,
            tags: record.tags,
            description: record.description,
            upload_date: record.upload_date,
            url,
            processed: record.processed,
            width: record.width,
            height: record.height,
            thumbnail_key: record.thumbnail_key.map(|key| key.to_string()),
            thumbnail_url,
        }
    }
}

/// Filters for listing images. Empty values are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageListQuery {
    /// Earliest upload date, inclusive (RFC 3339 timestamp or `YYYY-MM-DD`).
    #[param(example = "2024-05-01")]
    pub date_from: Option<String>,
    /// Latest upload date, inclusive (RFC 3339 timestamp or `YYYY-MM-DD`).
    #[param(example = "2024-05-31T23:59:59Z")]
    pub date_to: Option<String>,
    /// Exact, case-sensitive uploader name.
    pub uploader: Option<String>,
    /// Comma-separated tags; an image matches if it has any of them.
    #[param(example = "nature,urban")]
    pub tags: Option<String>,
}

/// Response DTO for a successful delete.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    #[schema(example = "Image deleted successfully")]
    pub message: String,
    pub id: Uuid,
}
