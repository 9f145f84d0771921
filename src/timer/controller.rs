use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    clock::Clock,
    db::{models::UserId, TimeStore},
    error::TrackerResult,
    log_error, log_info, log_warn,
};

use super::{SessionState, SessionStatus};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub elapsed_ms: u64,
    pub paused_ms: u64,
}

/// Result of a successful stop.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinishedSession {
    pub record_id: String,
    pub user_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub pause_ms: u64,
    pub working_ms: u64,
}

/// Drives one tracking attempt for one user.
///
/// Clones share state. Every transition holds the state lock for its whole
/// duration, persistence included, so calls from several tasks are applied one
/// at a time.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn TimeStore>,
    clock: Arc<dyn Clock>,
}

impl SessionController {
    pub fn new(user_id: UserId, store: Arc<dyn TimeStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new(user_id))),
            store,
            clock,
        }
    }

    /// True when both handles drive the same tracking attempt.
    pub fn same_session(&self, other: &SessionController) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let guard = self.state.lock().await;
        let now = self.clock.now();
        SessionSnapshot {
            elapsed_ms: guard.elapsed_ms_at(now),
            paused_ms: guard.paused_ms_at(now),
            state: guard.clone(),
        }
    }

    pub async fn start(&self) -> TrackerResult<SessionState> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        match state.start(now) {
            Ok(()) => {
                log_info!("Session started for user {} at {}", state.user_id, now);
                Ok(state.clone())
            }
            Err(err) => {
                log_warn!("Rejected start for user {}: {}", state.user_id, err);
                Err(err)
            }
        }
    }

    pub async fn pause(&self) -> TrackerResult<SessionState> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        match state.pause(now) {
            Ok(()) => {
                log_info!("Session paused for user {}", state.user_id);
                Ok(state.clone())
            }
            Err(err) => {
                log_warn!("Rejected pause for user {}: {}", state.user_id, err);
                Err(err)
            }
        }
    }

    pub async fn resume(&self) -> TrackerResult<SessionState> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        match state.resume(now) {
            Ok(()) => {
                log_info!(
                    "Session resumed for user {} ({} ms paused so far)",
                    state.user_id,
                    state.pause_accumulated_ms
                );
                Ok(state.clone())
            }
            Err(err) => {
                log_warn!("Rejected resume for user {}: {}", state.user_id, err);
                Err(err)
            }
        }
    }

    /// Ends the session and persists exactly one record.
    ///
    /// If the store fails the session keeps its previous state, so the same
    /// stop can be submitted again.
    pub async fn stop(&self) -> TrackerResult<FinishedSession> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let span = match state.closing_span(now) {
            Ok(span) => span,
            Err(err) => {
                log_warn!("Rejected stop for user {}: {}", state.user_id, err);
                return Err(err);
            }
        };

        let record_id = match self
            .store
            .add(state.user_id, span.start, span.end, span.pause_ms)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                log_error!("Failed to persist session for user {}: {}", state.user_id, err);
                return Err(err);
            }
        };

        state.finish(&span);

        let finished = FinishedSession {
            record_id,
            user_id: state.user_id,
            start: span.start,
            end: span.end,
            pause_ms: span.pause_ms,
            working_ms: span.working_ms(),
        };

        log_info!(
            "Session stopped for user {}: record {} with {} ms worked, {} ms paused",
            finished.user_id,
            finished.record_id,
            finished.working_ms,
            finished.pause_ms
        );

        Ok(finished)
    }

    /// Throws the running or paused session away without writing a record.
    pub async fn discard(&self) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        match state.discard() {
            Ok(()) => {
                log_info!("Session discarded for user {}", state.user_id);
                Ok(())
            }
            Err(err) => {
                log_warn!("Rejected discard for user {}: {}", state.user_id, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, db::MemoryStore, error::TrackerError};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    fn setup() -> (SessionController, Arc<MemoryStore>, ManualClock) {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap());
        let controller = SessionController::new(42, store.clone(), Arc::new(clock.clone()));
        (controller, store, clock)
    }

    #[tokio::test]
    async fn workday_with_coffee_break() {
        let (controller, store, clock) = setup();

        controller.start().await.unwrap();
        clock.advance(Duration::hours(1));
        controller.pause().await.unwrap();
        clock.advance(Duration::minutes(15));
        controller.resume().await.unwrap();
        clock.set(Utc.with_ymd_and_hms(2025, 9, 1, 17, 0, 0).unwrap());

        let finished = controller.stop().await.unwrap();
        assert_eq!(finished.pause_ms, Duration::minutes(15).num_milliseconds() as u64);
        assert_eq!(
            finished.working_ms,
            (Duration::hours(7) + Duration::minutes(45)).num_milliseconds() as u64
        );

        let record = store.get(&finished.record_id).await.unwrap();
        assert_eq!(record.user_id, 42);
        assert_eq!(record.total_duration(), Duration::hours(8));
        assert_eq!(record.working_ms(), finished.working_ms);
        assert_eq!(controller.status().await, SessionStatus::Stopped);
    }

    #[tokio::test]
    async fn stop_from_idle_writes_nothing() {
        let (controller, store, _clock) = setup();
        assert!(matches!(
            controller.stop().await,
            Err(TrackerError::IllegalTransition { .. })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn stop_at_or_before_start_writes_nothing() {
        let (controller, store, clock) = setup();
        controller.start().await.unwrap();

        assert!(matches!(controller.stop().await, Err(TrackerError::InvalidRange)));
        assert!(store.is_empty().await);

        clock.advance(Duration::minutes(-30));
        assert!(matches!(controller.stop().await, Err(TrackerError::InvalidRange)));
        assert!(store.is_empty().await);
        assert_eq!(controller.status().await, SessionStatus::Running);

        clock.advance(Duration::hours(1));
        let finished = controller.stop().await.unwrap();
        assert!(finished.start < finished.end);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn controller_is_single_use() {
        let (controller, store, clock) = setup();
        controller.start().await.unwrap();
        clock.advance(Duration::minutes(5));
        controller.stop().await.unwrap();

        assert!(controller.start().await.is_err());
        assert!(controller.stop().await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn discard_drops_session() {
        let (controller, store, clock) = setup();
        controller.start().await.unwrap();
        clock.advance(Duration::minutes(5));
        controller.pause().await.unwrap();
        controller.discard().await.unwrap();

        assert!(store.is_empty().await);
        assert_eq!(controller.status().await, SessionStatus::Stopped);
    }

    #[tokio::test]
    async fn snapshot_tracks_open_pause() {
        let (controller, _store, clock) = setup();
        controller.start().await.unwrap();
        clock.advance(Duration::minutes(40));
        controller.pause().await.unwrap();
        clock.advance(Duration::minutes(5));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.state.status, SessionStatus::Paused);
        assert_eq!(snapshot.paused_ms, Duration::minutes(5).num_milliseconds() as u64);
        assert_eq!(snapshot.elapsed_ms, Duration::minutes(40).num_milliseconds() as u64);
    }

    struct FailingStore;

    #[async_trait]
    impl TimeStore for FailingStore {
        async fn add(
            &self,
            _user_id: UserId,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _pause_ms: u64,
        ) -> TrackerResult<String> {
            Err(anyhow::anyhow!("database is locked").into())
        }
        async fn get(&self, id: &str) -> TrackerResult<crate::db::TimeRecord> {
            Err(TrackerError::NotFound(id.to_string()))
        }
        async fn get_all(&self, _user_id: UserId) -> TrackerResult<Vec<crate::db::TimeRecord>> {
            Ok(Vec::new())
        }
        async fn delete(&self, id: &str) -> TrackerResult<()> {
            Err(TrackerError::NotFound(id.to_string()))
        }
        async fn delete_all(&self, _user_id: UserId) -> TrackerResult<usize> {
            Ok(0)
        }
        async fn overlaps(
            &self,
            _user_id: UserId,
            _exclude_id: Option<&str>,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> TrackerResult<bool> {
            Ok(false)
        }
        async fn set_start(&self, id: &str, _start: DateTime<Utc>) -> TrackerResult<()> {
            Err(TrackerError::NotFound(id.to_string()))
        }
        async fn set_end(&self, id: &str, _end: DateTime<Utc>) -> TrackerResult<()> {
            Err(TrackerError::NotFound(id.to_string()))
        }
        async fn set_pause(&self, id: &str, _pause_ms: u64) -> TrackerResult<()> {
            Err(TrackerError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn failed_persist_keeps_session_alive() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap());
        let controller =
            SessionController::new(3, Arc::new(FailingStore), Arc::new(clock.clone()));

        controller.start().await.unwrap();
        clock.advance(Duration::minutes(10));
        controller.pause().await.unwrap();
        clock.advance(Duration::minutes(10));

        assert!(matches!(
            controller.stop().await,
            Err(TrackerError::StoreFailure(_))
        ));
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.state.status, SessionStatus::Paused);
        assert_eq!(snapshot.state.pause_accumulated_ms, 0);
        assert!(snapshot.state.pause_started_at.is_some());
    }
}
