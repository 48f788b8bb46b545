use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_record")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Original upload filename, verbatim.
    pub filename: String,

    pub blob_key: String,

    pub file_size: i64,

    /// Declared MIME type.
    pub file_type: String,

    #[sea_orm(indexed)]
    pub uploader: String,

    /// JSON array of tag strings.
    pub tags: Json,

    pub description: Option<String>,

    #[sea_orm(indexed)]
    pub upload_date: DateTimeUtc,

    pub width: Option<i32>,

    pub height: Option<i32>,

    pub thumbnail_key: Option<String>,

    #[sea_orm(default_value = false)]
    pub processed: bool,
}

impl ActiveModelBehavior for ActiveModel {}
