use std::time::Duration;

use async_trait::async_trait;
use sea_orm::prelude::Expr;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use super::entity::image;
use super::error::MetadataError;
use super::traits::MetadataStore;
use crate::filter::ImageFilter;
use crate::record::{ImageRecord, ProcessingResult};
use crate::storage::BlobKey;

/// Metadata store over a relational database.
///
/// Date and uploader filters, ordering and the row cap are pushed down to the
/// database. The tag filter runs on the fetched rows.
#[derive(Clone)]
pub struct DatabaseMetadataStore {
    db: DatabaseConnection,
}

impl DatabaseMetadataStore {
    /// Open a connection pool.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, MetadataError> {
        let mut opt = ConnectOptions::new(url.to_owned());
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(true);

        let db = Database::connect(opt).await?;
        Ok(Self { db })
    }

    /// Create or migrate the `image_record` table.
    pub async fn sync_schema(&self) -> Result<(), MetadataError> {
        self.db
            .get_schema_registry("common::metadata::entity::*")
            .sync(&self.db)
            .await?;
        Ok(())
    }
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_active_model(record: &ImageRecord) -> image::ActiveModel {
    image::ActiveModel {
        id: Set(record.id),
        filename: Set(record.filename.clone()),
        blob_key: Set(record.blob_key.to_string()),
        file_size: Set(i64::try_from(record.file_size).unwrap_or(i64::MAX)),
        file_type: Set(record.file_type.clone()),
        uploader: Set(record.uploader.clone()),
        tags: Set(serde_json::Value::from(record.tags.clone())),
        description: Set(record.description.clone()),
        upload_date: Set(record.upload_date),
        width: Set(record.width.map(clamp_i32)),
        height: Set(record.height.map(clamp_i32)),
        thumbnail_key: Set(record.thumbnail_key.as_ref().map(BlobKey::to_string)),
        processed: Set(record.processed),
    }
}

impl TryFrom<image::Model> for ImageRecord {
    type Error = MetadataError;

    fn try_from(model: image::Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let corrupt = |detail: String| MetadataError::Corrupt { id, detail };

        let tags: Vec<String> = serde_json::from_value(model.tags)
            .map_err(|e| corrupt(format!("tags: {e}")))?;
        let blob_key =
            BlobKey::parse(&model.blob_key).map_err(|e| corrupt(format!("blob_key: {e}")))?;
        let thumbnail_key = model
            .thumbnail_key
            .as_deref()
            .map(BlobKey::parse)
            .transpose()
            .map_err(|e| corrupt(format!("thumbnail_key: {e}")))?;

        Ok(ImageRecord {
            id,
            filename: model.filename,
            blob_key,
            file_size: u64::try_from(model.file_size).unwrap_or_default(),
            file_type: model.file_type,
            uploader: model.uploader,
            tags,
            description: model.description,
            upload_date: model.upload_date,
            width: model.width.and_then(|w| u32::try_from(w).ok()),
            height: model.height.and_then(|h| u32::try_from(h).ok()),
            thumbnail_key,
            processed: model.processed,
        })
    }
}

#[async_trait]
impl MetadataStore for DatabaseMetadataStore {
    async fn insert(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        match image::Entity::insert(to_active_model(record))
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(MetadataError::Duplicate(record.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>, MetadataError> {
        image::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(ImageRecord::try_from)
            .transpose()
    }

    async fn query(
        &self,
        filter: &ImageFilter,
        limit: usize,
    ) -> Result<Vec<ImageRecord>, MetadataError> {
        let mut select = image::Entity::find();

        if let Some(from) = filter.date_from {
            select = select.filter(image::Column::UploadDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            select = select.filter(image::Column::UploadDate.lte(to));
        }
        if let Some(uploader) = &filter.uploader {
            select = select.filter(image::Column::Uploader.eq(uploader.as_str()));
        }

        select = select
            .order_by_desc(image::Column::UploadDate)
            .order_by_desc(image::Column::Id);

        // Tag matching happens after the fetch, so the cap can only be pushed
        // down when there is no tag filter.
        if filter.tags.is_empty() {
            select = select.limit(limit as u64);
        }

        let mut records = Vec::new();
        for model in select.all(&self.db).await? {
            let record = ImageRecord::try_from(model)?;
            if filter.tags.is_empty() || record.has_any_tag(&filter.tags) {
                records.push(record);
                if records.len() >= limit {
                    break;
                }
            }
        }
        Ok(records)
    }

    async fn record_processing(
        &self,
        id: Uuid,
        result: &ProcessingResult,
    ) -> Result<(), MetadataError> {
        let updated = image::Entity::update_many()
            .col_expr(image::Column::Width, Expr::value(clamp_i32(result.width)))
            .col_expr(image::Column::Height, Expr::value(clamp_i32(result.height)))
            .col_expr(
                image::Column::ThumbnailKey,
                Expr::value(result.thumbnail_key.to_string()),
            )
            .col_expr(image::Column::Processed, Expr::value(true))
            .filter(image::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if updated.rows_affected == 0 {
            return Err(MetadataError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, MetadataError> {
        let deleted = image::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(deleted.rows_affected > 0)
    }
}
