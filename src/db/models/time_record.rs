//! Persisted time records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// One completed work interval.
///
/// `total_ms` is the gross span `end - start`. It is owned by the store and
/// recomputed whenever `start` or `end` changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRecord {
    pub id: String,
    pub user_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_ms: u64,
    pub pause_ms: u64,
}

impl TimeRecord {
    pub fn total_duration(&self) -> Duration {
        Duration::milliseconds(self.total_ms as i64)
    }

    pub fn pause_duration(&self) -> Duration {
        Duration::milliseconds(self.pause_ms as i64)
    }

    pub fn working_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.pause_ms)
    }
}
