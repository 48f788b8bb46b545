use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::error::MetadataError;
use super::traits::MetadataStore;
use crate::filter::ImageFilter;
use crate::record::{ImageRecord, ProcessingResult};

/// Key-value metadata store held in process memory.
///
/// Queries scan every record and filter client-side.
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: RwLock<HashMap<Uuid, ImageRecord>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> MetadataError {
        MetadataError::Unavailable("memory metadata store lock poisoned".into())
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        match records.entry(record.id) {
            Entry::Occupied(_) => Err(MetadataError::Duplicate(record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImageRecord>, MetadataError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(&id).cloned())
    }

    async fn query(
        &self,
        filter: &ImageFilter,
        limit: usize,
    ) -> Result<Vec<ImageRecord>, MetadataError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let mut matched: Vec<ImageRecord> = records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        drop(records);

        matched.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        matched.truncate(limit);
        Ok(matched)
    }

    async fn record_processing(
        &self,
        id: Uuid,
        result: &ProcessingResult,
    ) -> Result<(), MetadataError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let record = records.get_mut(&id).ok_or(MetadataError::NotFound(id))?;
        record.apply_processing(result);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, MetadataError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        Ok(records.remove(&id).is_some())
    }
}
