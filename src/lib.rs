pub mod clock;
pub mod config;
pub mod db;
pub mod duration;
pub mod error;
pub mod records;
pub mod settings;
pub mod timer;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};

use clock::{Clock, SystemClock};
use config::AppConfig;
use db::{models::UserId, Database, TimeStore};
use error::{TrackerError, TrackerResult};
use settings::SettingsStore;
use timer::{SessionController, SessionRegistry, SessionStatus};

/// Everything a host (UI, CLI, tests) needs to drive time tracking.
pub struct AppState {
    store: Arc<dyn TimeStore>,
    sessions: SessionRegistry,
    settings: SettingsStore,
    clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn TimeStore>, settings: SettingsStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: SessionRegistry::new(store.clone(), clock.clone()),
            store,
            settings,
            clock,
        }
    }

    pub fn store(&self) -> &dyn TimeStore {
        self.store.as_ref()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Registers the user's session and, if the user asked for it, starts tracking.
    pub async fn sign_in(&self, user_id: UserId) -> TrackerResult<SessionController> {
        let controller = self.sessions.begin(user_id).await;
        if self.settings.user(user_id).automatic_time_tracking
            && controller.status().await == SessionStatus::Idle
        {
            info!("Automatic time tracking enabled for user {user_id}");
            controller.start().await?;
        }
        Ok(controller)
    }

    /// Drops any live session without saving it and deletes all of the user's
    /// records and settings. Returns the number of deleted records.
    pub async fn remove_user(&self, user_id: UserId) -> TrackerResult<usize> {
        if let Some(controller) = self.sessions.end(user_id).await {
            match controller.discard().await {
                Ok(()) => warn!("Discarded live session of removed user {user_id}"),
                // Idle, or stopped by another task in the meantime.
                Err(TrackerError::IllegalTransition { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        let deleted = self.store.delete_all(user_id).await?;
        self.settings.remove_user(user_id)?;
        info!("Removed user {user_id} with {deleted} time records");
        Ok(deleted)
    }
}

/// Opens the SQLite store and settings under `config.data_dir`.
pub fn init(config: &AppConfig) -> anyhow::Result<AppState> {
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("failed to create data directory {}", config.data_dir.display())
    })?;

    let database = Database::new(config.database_path())?;
    let settings = SettingsStore::new(config.settings_path())?;

    info!("Worktime data directory: {}", config.data_dir.display());

    Ok(AppState::new(
        Arc::new(database),
        settings,
        Arc::new(SystemClock),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, db::MemoryStore, settings::UserSettings};
    use chrono::{Duration, TimeZone, Utc};

    fn state(dir: &tempfile::TempDir, clock: &ManualClock) -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            SettingsStore::new(dir.path().join("settings.json")).unwrap(),
            Arc::new(clock.clone()),
        )
    }

    #[tokio::test]
    async fn sign_in_honours_automatic_tracking() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 7, 8, 0, 0).unwrap());
        let state = state(&dir, &clock);
        state
            .settings()
            .update_user(
                2,
                UserSettings {
                    automatic_time_tracking: true,
                },
            )
            .unwrap();

        let manual = state.sign_in(1).await.unwrap();
        assert_eq!(manual.status().await, SessionStatus::Idle);

        let automatic = state.sign_in(2).await.unwrap();
        assert_eq!(automatic.status().await, SessionStatus::Running);

        // Signing in again keeps the running session.
        let again = state.sign_in(2).await.unwrap();
        assert_eq!(again.status().await, SessionStatus::Running);
    }

    #[tokio::test]
    async fn remove_user_discards_session_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 7, 8, 0, 0).unwrap());
        let state = state(&dir, &clock);

        let session = state.sign_in(9).await.unwrap();
        session.start().await.unwrap();
        clock.advance(Duration::hours(1));
        session.stop().await.unwrap();

        let next = state.sign_in(9).await.unwrap();
        next.start().await.unwrap();
        clock.advance(Duration::minutes(20));

        assert_eq!(state.remove_user(9).await.unwrap(), 1);
        assert_eq!(next.status().await, SessionStatus::Stopped);
        assert!(state.store().get_all(9).await.unwrap().is_empty());
        assert!(state.sessions().get(9).await.is_none());
    }

    #[tokio::test]
    async fn remove_user_after_concurrent_stop_still_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 8, 8, 0, 0).unwrap());
        let state = state(&dir, &clock);

        let session = state.sign_in(4).await.unwrap();
        session.start().await.unwrap();
        clock.advance(Duration::hours(2));
        // The session stops after it was looked up but before removal ends it.
        session.stop().await.unwrap();

        assert_eq!(state.remove_user(4).await.unwrap(), 1);
        assert!(state.store().get_all(4).await.unwrap().is_empty());
        assert_eq!(session.status().await, SessionStatus::Stopped);
    }
}
