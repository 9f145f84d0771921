use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::{
    db::{
        connection::Database,
        helpers::{format_datetime, parse_datetime, to_i64, to_u64},
        models::{TimeRecord, UserId},
        store::TimeStore,
    },
    duration::span_ms,
    error::{TrackerError, TrackerResult},
};

const SELECT_COLUMNS: &str = "SELECT id, user_id, start_at, end_at, total_ms, pause_ms FROM time_records";

fn row_to_record(row: &Row) -> Result<TimeRecord> {
    let start_at: String = row.get("start_at")?;
    let end_at: String = row.get("end_at")?;
    let total_ms: i64 = row.get("total_ms")?;
    let pause_ms: i64 = row.get("pause_ms")?;

    Ok(TimeRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        start: parse_datetime(&start_at, "start_at")?,
        end: parse_datetime(&end_at, "end_at")?,
        total_ms: to_u64(total_ms, "total_ms")?,
        pause_ms: to_u64(pause_ms, "pause_ms")?,
    })
}

impl Database {
    pub async fn insert_time_record(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pause_ms: u64,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let record_id = id.clone();
        self.execute(move |conn| {
            let now = format_datetime(Utc::now());
            conn.execute(
                "INSERT INTO time_records (id, user_id, start_at, end_at, total_ms, pause_ms, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record_id,
                    user_id,
                    format_datetime(start),
                    format_datetime(end),
                    to_i64(span_ms(start, end))?,
                    to_i64(pause_ms)?,
                    now,
                    now,
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(id)
    }

    pub async fn get_time_record(&self, id: &str) -> Result<Option<TimeRecord>> {
        let id = id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            let mut rows = stmt.query(params![id])?;
            let record = match rows.next()? {
                Some(row) => Some(row_to_record(row)?),
                None => None,
            };
            Ok(record)
        })
        .await
    }

    pub async fn list_time_records(&self, user_id: UserId) -> Result<Vec<TimeRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY start_at ASC"
            ))?;

            let mut rows = stmt.query(params![user_id])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }

    /// Returns false when no record with `id` exists.
    pub async fn delete_time_record(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM time_records WHERE id = ?1", params![id])?;
            Ok(rows_affected > 0)
        })
        .await
    }

    pub async fn delete_user_time_records(&self, user_id: UserId) -> Result<usize> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM time_records WHERE user_id = ?1",
                params![user_id],
            )?;
            Ok(rows_affected)
        })
        .await
    }

    pub async fn has_overlapping_record(
        &self,
        user_id: UserId,
        exclude_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        let exclude_id = exclude_id.map(str::to_string);
        self.execute(move |conn| {
            let hit: Option<String> = conn
                .query_row(
                    "SELECT id FROM time_records
                     WHERE user_id = ?1
                       AND (?2 IS NULL OR id <> ?2)
                       AND start_at < ?4
                       AND end_at > ?3
                     LIMIT 1",
                    params![
                        user_id,
                        exclude_id,
                        format_datetime(start),
                        format_datetime(end),
                    ],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(hit.is_some())
        })
        .await
    }

    /// Moves one end of the interval and recomputes `total_ms` in the same
    /// transaction.
    async fn update_record_bound(
        &self,
        id: &str,
        bound: Bound,
        value: DateTime<Utc>,
    ) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let current: Option<(String, String)> = tx
                .query_row(
                    "SELECT start_at, end_at FROM time_records WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((start_at, end_at)) = current else {
                return Ok(false);
            };

            let (start, end) = match bound {
                Bound::Start => (value, parse_datetime(&end_at, "end_at")?),
                Bound::End => (parse_datetime(&start_at, "start_at")?, value),
            };

            tx.execute(
                "UPDATE time_records
                 SET start_at = ?1,
                     end_at = ?2,
                     total_ms = ?3,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    format_datetime(start),
                    format_datetime(end),
                    to_i64(span_ms(start, end))?,
                    format_datetime(Utc::now()),
                    id,
                ],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    pub async fn update_record_pause(&self, id: &str, pause_ms: u64) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE time_records
                 SET pause_ms = ?1,
                     updated_at = ?2
                 WHERE id = ?3",
                params![to_i64(pause_ms)?, format_datetime(Utc::now()), id],
            )?;
            Ok(rows_affected > 0)
        })
        .await
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn found(id: &str, exists: bool) -> TrackerResult<()> {
    if exists {
        Ok(())
    } else {
        Err(TrackerError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl TimeStore for Database {
    async fn add(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pause_ms: u64,
    ) -> TrackerResult<String> {
        Ok(self.insert_time_record(user_id, start, end, pause_ms).await?)
    }

    async fn get(&self, id: &str) -> TrackerResult<TimeRecord> {
        self.get_time_record(id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    async fn get_all(&self, user_id: UserId) -> TrackerResult<Vec<TimeRecord>> {
        Ok(self.list_time_records(user_id).await?)
    }

    async fn delete(&self, id: &str) -> TrackerResult<()> {
        let exists = self.delete_time_record(id).await?;
        found(id, exists)
    }

    async fn delete_all(&self, user_id: UserId) -> TrackerResult<usize> {
        Ok(self.delete_user_time_records(user_id).await?)
    }

    async fn overlaps(
        &self,
        user_id: UserId,
        exclude_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TrackerResult<bool> {
        Ok(self
            .has_overlapping_record(user_id, exclude_id, start, end)
            .await?)
    }

    async fn set_start(&self, id: &str, start: DateTime<Utc>) -> TrackerResult<()> {
        let exists = self.update_record_bound(id, Bound::Start, start).await?;
        found(id, exists)
    }

    async fn set_end(&self, id: &str, end: DateTime<Utc>) -> TrackerResult<()> {
        let exists = self.update_record_bound(id, Bound::End, end).await?;
        found(id, exists)
    }

    async fn set_pause(&self, id: &str, pause_ms: u64) -> TrackerResult<()> {
        let exists = self.update_record_pause(id, pause_ms).await?;
        found(id, exists)
    }
}
