use crate::{
    db::models::{TimeRecord, UserId},
    error::{TrackerError, TrackerResult},
    records::{edit, report, MonthlyReport, RecordEdit},
    AppState,
};

/// Loads a record, hiding records of other users behind `NotFound`.
async fn owned_record(state: &AppState, user_id: UserId, record_id: &str) -> TrackerResult<TimeRecord> {
    let record = state.store().get(record_id).await?;
    if record.user_id != user_id {
        return Err(TrackerError::NotFound(record_id.to_string()));
    }
    Ok(record)
}

pub async fn list_records(state: &AppState, user_id: UserId) -> Result<Vec<TimeRecord>, String> {
    state
        .store()
        .get_all(user_id)
        .await
        .map_err(TrackerError::into_message)
}

pub async fn get_record(
    state: &AppState,
    user_id: UserId,
    record_id: String,
) -> Result<TimeRecord, String> {
    owned_record(state, user_id, &record_id)
        .await
        .map_err(TrackerError::into_message)
}

/// Returns the record as stored after the edit.
pub async fn edit_record(
    state: &AppState,
    user_id: UserId,
    record_id: String,
    changes: RecordEdit,
) -> Result<TimeRecord, String> {
    owned_record(state, user_id, &record_id)
        .await
        .map_err(TrackerError::into_message)?;

    let now = state.clock().now();
    let outcome = edit::edit_record(state.store(), &record_id, &changes, now)
        .await
        .map_err(TrackerError::into_message)?;

    if !outcome.is_success() {
        let failed: Vec<&str> = outcome
            .failed_fields()
            .into_iter()
            .map(|field| field.as_str())
            .collect();
        return Err(format!(
            "Failed to save {} of time record {}; please try again",
            failed.join(", "),
            record_id
        ));
    }

    state
        .store()
        .get(&record_id)
        .await
        .map_err(TrackerError::into_message)
}

pub async fn delete_record(state: &AppState, user_id: UserId, record_id: String) -> Result<(), String> {
    owned_record(state, user_id, &record_id)
        .await
        .map_err(TrackerError::into_message)?;
    state
        .store()
        .delete(&record_id)
        .await
        .map_err(TrackerError::into_message)
}

pub async fn delete_user(state: &AppState, user_id: UserId) -> Result<usize, String> {
    state.remove_user(user_id).await.map_err(TrackerError::into_message)
}

pub async fn get_monthly_report(
    state: &AppState,
    user_id: UserId,
    year: i32,
    month: u32,
) -> Result<MonthlyReport, String> {
    report::monthly_report(state.store(), user_id, year, month)
        .await
        .map_err(TrackerError::into_message)
}
