//! In-process record store
//!
//! Mirrors the record shape of the remote store (`id` plus a `xata` metadata
//! object) so local runs and tests see the same payloads as production.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{client_id, is_addressable_id, StoreError, StoreResult, UserStore};
use crate::models::Record;

const METADATA_KEY: &str = "xata";

/// Record store kept in memory, in insertion order
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records; each must carry a string `id`
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn generate_id() -> String {
        format!("rec_{}", Uuid::new_v4().simple())
    }

    fn record_id(record: &Record) -> Option<&str> {
        record.get("id").and_then(Value::as_str)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Record>> {
        Ok(self.records.read().await.clone())
    }

    async fn read(&self, id: &str) -> StoreResult<Option<Record>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| Self::record_id(record) == Some(id))
            .cloned())
    }

    async fn create(&self, mut fields: Record) -> StoreResult<Record> {
        let mut records = self.records.write().await;

        let id = match client_id(&mut fields) {
            Some(id) if !is_addressable_id(&id) => return Err(StoreError::InvalidId(id)),
            Some(id) => id,
            None => Self::generate_id(),
        };

        if records
            .iter()
            .any(|record| Self::record_id(record) == Some(id.as_str()))
        {
            return Err(StoreError::Status {
                status: 409,
                body: format!("record with id {} already exists", id),
            });
        }

        fields.remove(METADATA_KEY);
        let now = Utc::now().to_rfc3339();

        let mut record = Record::new();
        record.insert("id".to_string(), Value::String(id));
        record.extend(fields);
        record.insert(
            METADATA_KEY.to_string(),
            json!({ "createdAt": now, "updatedAt": now, "version": 0 }),
        );

        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, mut fields: Record) -> StoreResult<Record> {
        let mut records = self.records.write().await;

        let record = records
            .iter_mut()
            .find(|record| Self::record_id(record) == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        fields.remove("id");
        fields.remove(METADATA_KEY);
        record.extend(fields);

        let version = record
            .get(METADATA_KEY)
            .and_then(|meta| meta.get("version"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let created_at = record
            .get(METADATA_KEY)
            .and_then(|meta| meta.get("createdAt"))
            .cloned()
            .unwrap_or(Value::Null);
        record.insert(
            METADATA_KEY.to_string(),
            json!({
                "createdAt": created_at,
                "updatedAt": Utc::now().to_rfc3339(),
                "version": version + 1,
            }),
        );

        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;

        let position = records
            .iter()
            .position(|record| Self::record_id(record) == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        records.remove(position);
        Ok(())
    }
}
