use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::{
    db::models::TimeRecord,
    error::{TrackerError, TrackerResult},
};

/// Milliseconds between two instants, clamped at zero.
pub(crate) fn span_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}

pub fn gross_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> TrackerResult<Duration> {
    if end <= start {
        return Err(TrackerError::InvalidRange);
    }
    Ok(end - start)
}

/// Working time of a record. Zero if the pause exceeds the span, which only
/// happens when edit validation was bypassed.
pub fn working_duration(record: &TimeRecord) -> Duration {
    Duration::milliseconds(record.working_ms() as i64)
}

pub fn in_month(record: &TimeRecord, year: i32, month: u32) -> bool {
    record.start.year() == year && record.start.month() == month
}

/// Sums over a set of records, as shown at the bottom of a monthly sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub gross_ms: u64,
    pub pause_ms: u64,
}

impl Totals {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TimeRecord>,
    {
        records.into_iter().fold(Self::default(), |acc, record| Self {
            gross_ms: acc.gross_ms.saturating_add(record.total_ms),
            pause_ms: acc.pause_ms.saturating_add(record.pause_ms),
        })
    }

    pub fn working_ms(&self) -> u64 {
        self.gross_ms.saturating_sub(self.pause_ms)
    }
}
