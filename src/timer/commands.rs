use crate::{
    db::models::UserId,
    error::TrackerError,
    timer::{FinishedSession, SessionController, SessionSnapshot, SessionState, SessionStatus},
    AppState,
};

async fn live_controller(
    state: &AppState,
    user_id: UserId,
    action: &'static str,
) -> Result<SessionController, String> {
    state.sessions().get(user_id).await.ok_or_else(|| {
        TrackerError::IllegalTransition {
            action,
            status: SessionStatus::Idle,
        }
        .into_message()
    })
}

pub async fn get_tracking_state(
    state: &AppState,
    user_id: UserId,
) -> Result<Option<SessionSnapshot>, String> {
    match state.sessions().get(user_id).await {
        Some(controller) => Ok(Some(controller.snapshot().await)),
        None => Ok(None),
    }
}

pub async fn start_tracking(state: &AppState, user_id: UserId) -> Result<SessionState, String> {
    let controller = state.sessions().begin(user_id).await;
    controller.start().await.map_err(TrackerError::into_message)
}

pub async fn pause_tracking(state: &AppState, user_id: UserId) -> Result<SessionState, String> {
    let controller = live_controller(state, user_id, "pause").await?;
    controller.pause().await.map_err(TrackerError::into_message)
}

pub async fn resume_tracking(state: &AppState, user_id: UserId) -> Result<SessionState, String> {
    let controller = live_controller(state, user_id, "resume").await?;
    controller.resume().await.map_err(TrackerError::into_message)
}

pub async fn stop_tracking(state: &AppState, user_id: UserId) -> Result<FinishedSession, String> {
    let controller = live_controller(state, user_id, "stop").await?;
    controller.stop().await.map_err(TrackerError::into_message)
}

pub async fn discard_tracking(state: &AppState, user_id: UserId) -> Result<(), String> {
    let controller = live_controller(state, user_id, "discard").await?;
    controller.discard().await.map_err(TrackerError::into_message)
}
