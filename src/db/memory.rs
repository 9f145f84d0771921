use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::{
        models::{TimeRecord, UserId},
        store::TimeStore,
    },
    duration::span_ms,
    error::{TrackerError, TrackerResult},
};

/// Record store kept in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, TimeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TimeStore for MemoryStore {
    async fn add(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pause_ms: u64,
    ) -> TrackerResult<String> {
        let id = Uuid::new_v4().to_string();
        let record = TimeRecord {
            id: id.clone(),
            user_id,
            start,
            end,
            total_ms: span_ms(start, end),
            pause_ms,
        };
        self.records.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn get(&self, id: &str) -> TrackerResult<TimeRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    async fn get_all(&self, user_id: UserId) -> TrackerResult<Vec<TimeRecord>> {
        let mut records: Vec<TimeRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.start);
        Ok(records)
    }

    async fn delete(&self, id: &str) -> TrackerResult<()> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    async fn delete_all(&self, user_id: UserId) -> TrackerResult<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.user_id != user_id);
        Ok(before - records.len())
    }

    async fn overlaps(
        &self,
        user_id: UserId,
        exclude_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TrackerResult<bool> {
        Ok(self.records.read().await.values().any(|record| {
            record.user_id == user_id
                && Some(record.id.as_str()) != exclude_id
                && record.start < end
                && record.end > start
        }))
    }

    async fn set_start(&self, id: &str, start: DateTime<Utc>) -> TrackerResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        record.start = start;
        record.total_ms = span_ms(record.start, record.end);
        Ok(())
    }

    async fn set_end(&self, id: &str, end: DateTime<Utc>) -> TrackerResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        record.end = end;
        record.total_ms = span_ms(record.start, record.end);
        Ok(())
    }

    async fn set_pause(&self, id: &str, pause_ms: u64) -> TrackerResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        record.pause_ms = pause_ms;
        Ok(())
    }
}
