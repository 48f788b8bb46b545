use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::BlobKey;

/// Request sent to the thumbnail processor after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProcessRequest {
    /// Bucket name or base directory of the blob store.
    #[schema(example = "lumina-gallery-images")]
    pub blob_location: String,
    #[schema(value_type = String, example = "0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f.png")]
    pub blob_key: BlobKey,
    pub image_id: Uuid,
}

/// What the processor derived from an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProcessOutcome {
    pub image_id: Uuid,
    #[schema(example = 1920)]
    pub width: u32,
    #[schema(example = 1080)]
    pub height: u32,
    #[schema(value_type = String, example = "thumbnails/0190a5c2-7c1e-7d2a-9a8e-3f2b1c4d5e6f.png")]
    pub thumbnail_key: BlobKey,
}
