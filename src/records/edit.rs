//! Manual edits of persisted time records.
//!
//! An edit always carries the full proposed triple (start, end, pause). It is
//! checked as a whole against the record store before any field is written;
//! afterwards only the fields that actually changed are updated, one store
//! call each.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::{models::TimeRecord, TimeStore},
    duration::{gross_duration, span_ms},
    error::{EditedField, TrackerError, TrackerResult},
};

/// Proposed values as entered by the user; `None` means the field was left blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEdit {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub pause_ms: Option<u64>,
}

impl RecordEdit {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, pause_ms: u64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            pause_ms: Some(pause_ms),
        }
    }
}

/// An edit that passed every check. Only obtainable from [`validate_edit`].
#[derive(Debug, Clone)]
pub struct ValidatedEdit {
    original: TimeRecord,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    pause_ms: u64,
}

impl ValidatedEdit {
    pub fn record_id(&self) -> &str {
        &self.original.id
    }

    pub fn changed_fields(&self) -> Vec<EditedField> {
        let mut fields = Vec::new();
        if self.start != self.original.start {
            fields.push(EditedField::Start);
        }
        if self.end != self.original.end {
            fields.push(EditedField::End);
        }
        if self.pause_ms != self.original.pause_ms {
            fields.push(EditedField::Pause);
        }
        fields
    }
}

#[derive(Debug)]
pub struct FieldOutcome {
    pub field: EditedField,
    pub result: TrackerResult<()>,
}

/// Per-field results of applying an edit. Fields that did not change are absent.
#[derive(Debug, Default)]
pub struct EditReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl EditReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failed_fields(&self) -> Vec<EditedField> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .map(|outcome| outcome.field)
            .collect()
    }
}

/// Checks run in order: presence, future timestamps, range, pause, overlap.
pub async fn validate_edit(
    store: &dyn TimeStore,
    record_id: &str,
    edit: &RecordEdit,
    now: DateTime<Utc>,
) -> TrackerResult<ValidatedEdit> {
    let original = store.get(record_id).await?;

    let start = edit.start.ok_or(TrackerError::MissingField(EditedField::Start))?;
    let end = edit.end.ok_or(TrackerError::MissingField(EditedField::End))?;
    let pause_ms = edit
        .pause_ms
        .ok_or(TrackerError::MissingField(EditedField::Pause))?;

    if start > now {
        return Err(TrackerError::FutureTimestamp(EditedField::Start));
    }
    if end > now {
        return Err(TrackerError::FutureTimestamp(EditedField::End));
    }

    gross_duration(start, end)?;

    let available_ms = span_ms(start, end);
    if pause_ms > available_ms {
        return Err(TrackerError::PauseExceedsSpan {
            pause_ms,
            span_ms: available_ms,
        });
    }

    if store
        .overlaps(original.user_id, Some(&original.id), start, end)
        .await?
    {
        return Err(TrackerError::OverlappingInterval);
    }

    Ok(ValidatedEdit {
        original,
        start,
        end,
        pause_ms,
    })
}

/// Writes the changed fields. A failure on one field does not undo the others.
pub async fn apply_edit(store: &dyn TimeStore, edit: &ValidatedEdit) -> EditReport {
    let id = edit.record_id();
    let mut report = EditReport::default();

    for field in edit.changed_fields() {
        let result = match field {
            EditedField::Start => store.set_start(id, edit.start).await,
            EditedField::End => store.set_end(id, edit.end).await,
            EditedField::Pause => store.set_pause(id, edit.pause_ms).await,
        };
        if let Err(err) = &result {
            log::error!("Failed to update {} of time record {}: {}", field, id, err);
        }
        report.outcomes.push(FieldOutcome { field, result });
    }

    report
}

/// Validates, then applies.
pub async fn edit_record(
    store: &dyn TimeStore,
    record_id: &str,
    edit: &RecordEdit,
    now: DateTime<Utc>,
) -> TrackerResult<EditReport> {
    let validated = validate_edit(store, record_id, edit, now).await?;
    Ok(apply_edit(store, &validated).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, day, hour, min, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        at(20, 12, 0)
    }

    fn minutes(n: i64) -> u64 {
        Duration::minutes(n).num_milliseconds() as u64
    }

    async fn store_with_day() -> (MemoryStore, String, String) {
        let store = MemoryStore::new();
        let morning = store.add(1, at(14, 8, 0), at(14, 12, 0), minutes(10)).await.unwrap();
        let afternoon = store.add(1, at(14, 13, 0), at(14, 17, 0), 0).await.unwrap();
        (store, morning, afternoon)
    }

    #[tokio::test]
    async fn blank_field_is_missing() {
        let (store, morning, _) = store_with_day().await;
        let edit = RecordEdit {
            start: Some(at(14, 8, 0)),
            end: None,
            pause_ms: Some(0),
        };
        assert!(matches!(
            validate_edit(&store, &morning, &edit, now()).await,
            Err(TrackerError::MissingField(EditedField::End))
        ));
    }

    #[tokio::test]
    async fn future_timestamps_rejected() {
        let (store, morning, _) = store_with_day().await;
        let edit = RecordEdit::new(at(14, 8, 0), now() + Duration::seconds(1), 0);
        assert!(matches!(
            validate_edit(&store, &morning, &edit, now()).await,
            Err(TrackerError::FutureTimestamp(EditedField::End))
        ));
    }

    #[tokio::test]
    async fn future_start_reported_before_end() {
        let (store, morning, _) = store_with_day().await;
        let edit = RecordEdit::new(now() + Duration::minutes(5), now() + Duration::hours(1), 0);
        assert!(matches!(
            validate_edit(&store, &morning, &edit, now()).await,
            Err(TrackerError::FutureTimestamp(EditedField::Start))
        ));
        assert_eq!(store.get(&morning).await.unwrap().start, at(14, 8, 0));
    }

    #[tokio::test]
    async fn start_at_or_after_end_is_invalid_range() {
        let (store, morning, _) = store_with_day().await;
        for start in [at(14, 12, 0), at(14, 12, 30)] {
            let edit = RecordEdit::new(start, at(14, 12, 0), 0);
            assert!(matches!(
                validate_edit(&store, &morning, &edit, now()).await,
                Err(TrackerError::InvalidRange)
            ));
        }
    }

    #[tokio::test]
    async fn pause_longer_than_span_rejected() {
        let (store, morning, _) = store_with_day().await;
        let edit = RecordEdit::new(at(14, 8, 0), at(14, 9, 0), minutes(61));
        assert!(matches!(
            validate_edit(&store, &morning, &edit, now()).await,
            Err(TrackerError::PauseExceedsSpan { .. })
        ));

        let edit = RecordEdit::new(at(14, 8, 0), at(14, 9, 0), minutes(60));
        assert!(validate_edit(&store, &morning, &edit, now()).await.is_ok());
    }

    #[tokio::test]
    async fn overlap_rejected_but_abutting_accepted() {
        let (store, morning, _) = store_with_day().await;

        let edit = RecordEdit::new(at(14, 8, 0), at(14, 13, 30), 0);
        assert!(matches!(
            validate_edit(&store, &morning, &edit, now()).await,
            Err(TrackerError::OverlappingInterval)
        ));

        let edit = RecordEdit::new(at(14, 8, 0), at(14, 13, 0), 0);
        assert!(validate_edit(&store, &morning, &edit, now()).await.is_ok());
    }

    #[tokio::test]
    async fn other_users_do_not_overlap() {
        let (store, morning, _) = store_with_day().await;
        store.add(2, at(14, 6, 0), at(14, 18, 0), 0).await.unwrap();
        let edit = RecordEdit::new(at(14, 7, 0), at(14, 12, 0), 0);
        assert!(validate_edit(&store, &morning, &edit, now()).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_record_not_found() {
        let (store, _, _) = store_with_day().await;
        let edit = RecordEdit::new(at(14, 7, 0), at(14, 8, 0), 0);
        assert!(matches!(
            validate_edit(&store, "missing", &edit, now()).await,
            Err(TrackerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_changed_fields_are_written() {
        let (store, morning, _) = store_with_day().await;
        let edit = RecordEdit::new(at(14, 7, 30), at(14, 12, 0), minutes(10));

        let report = edit_record(&store, &morning, &edit, now()).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].field, EditedField::Start);

        let record = store.get(&morning).await.unwrap();
        assert_eq!(record.start, at(14, 7, 30));
        assert_eq!(record.total_duration(), Duration::minutes(270));
        assert_eq!(record.pause_ms, minutes(10));
    }

    #[tokio::test]
    async fn record_moved_past_its_old_end() {
        let (store, morning, _) = store_with_day().await;
        let edit = RecordEdit::new(at(15, 9, 0), at(15, 11, 0), minutes(5));

        let report = edit_record(&store, &morning, &edit, now()).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.outcomes.len(), 3);

        let record = store.get(&morning).await.unwrap();
        assert_eq!((record.start, record.end), (at(15, 9, 0), at(15, 11, 0)));
        assert_eq!(record.total_duration(), Duration::hours(2));
        assert_eq!(record.working_ms(), minutes(115));
    }
}
