use serde::Serialize;

use crate::{
    db::{
        models::{TimeRecord, UserId},
        TimeStore,
    },
    duration::{in_month, Totals},
    error::{TrackerError, TrackerResult},
};

/// Records of one user whose start falls in a calendar month (UTC), with sums.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub records: Vec<TimeRecord>,
    pub gross_ms: u64,
    pub pause_ms: u64,
    pub working_ms: u64,
}

pub async fn monthly_report(
    store: &dyn TimeStore,
    user_id: UserId,
    year: i32,
    month: u32,
) -> TrackerResult<MonthlyReport> {
    if !(1..=12).contains(&month) {
        return Err(TrackerError::InvalidRange);
    }

    let records: Vec<TimeRecord> = store
        .get_all(user_id)
        .await?
        .into_iter()
        .filter(|record| in_month(record, year, month))
        .collect();
    let totals = Totals::from_records(&records);

    Ok(MonthlyReport {
        user_id,
        year,
        month,
        gross_ms: totals.gross_ms,
        pause_ms: totals.pause_ms,
        working_ms: totals.working_ms(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn month_boundaries_follow_start() {
        let store = MemoryStore::new();
        let night = Utc.with_ymd_and_hms(2025, 10, 31, 22, 0, 0).unwrap();
        store
            .add(1, night, night + Duration::hours(4), 0)
            .await
            .unwrap();
        let day = Utc.with_ymd_and_hms(2025, 11, 3, 8, 0, 0).unwrap();
        store
            .add(1, day, day + Duration::hours(9), Duration::minutes(30).num_milliseconds() as u64)
            .await
            .unwrap();

        let october = monthly_report(&store, 1, 2025, 10).await.unwrap();
        assert_eq!(october.records.len(), 1);
        assert_eq!(october.working_ms, Duration::hours(4).num_milliseconds() as u64);

        let november = monthly_report(&store, 1, 2025, 11).await.unwrap();
        assert_eq!(november.gross_ms, Duration::hours(9).num_milliseconds() as u64);
        assert_eq!(
            november.working_ms,
            (Duration::hours(8) + Duration::minutes(30)).num_milliseconds() as u64
        );
    }

    #[tokio::test]
    async fn rejects_month_out_of_range() {
        let store = MemoryStore::new();
        assert!(matches!(
            monthly_report(&store, 1, 2025, 13).await,
            Err(TrackerError::InvalidRange)
        ));
    }
}
