use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::models::{TimeRecord, UserId},
    error::TrackerResult,
};

/// Persistence for time records.
///
/// Sessions and the edit validator only ever talk to this trait; connection
/// handling, schema and file lifecycle belong to the implementation.
#[async_trait]
pub trait TimeStore: Send + Sync {
    /// Inserts a finished record and returns its newly assigned id.
    async fn add(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pause_ms: u64,
    ) -> TrackerResult<String>;

    async fn get(&self, id: &str) -> TrackerResult<TimeRecord>;

    /// All records of a user, oldest start first.
    async fn get_all(&self, user_id: UserId) -> TrackerResult<Vec<TimeRecord>>;

    async fn delete(&self, id: &str) -> TrackerResult<()>;

    /// Removes every record of a user and returns how many were deleted.
    async fn delete_all(&self, user_id: UserId) -> TrackerResult<usize>;

    /// Whether `[start, end)` intersects any record of `user_id` other than
    /// `exclude_id`. Touching endpoints do not count.
    async fn overlaps(
        &self,
        user_id: UserId,
        exclude_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TrackerResult<bool>;

    async fn set_start(&self, id: &str, start: DateTime<Utc>) -> TrackerResult<()>;

    async fn set_end(&self, id: &str, end: DateTime<Utc>) -> TrackerResult<()>;

    async fn set_pause(&self, id: &str, pause_ms: u64) -> TrackerResult<()>;
}
