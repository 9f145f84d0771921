use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    clock::Clock,
    db::{models::UserId, TimeStore},
};

use super::{SessionController, SessionStatus};

/// One live session controller per signed-in user.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<UserId, SessionController>>>,
    store: Arc<dyn TimeStore>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn TimeStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            store,
            clock,
        }
    }

    /// Returns the user's current controller, replacing it with a fresh one
    /// once the previous attempt has stopped.
    ///
    /// The map lock is never held while waiting on a controller, so a slow stop
    /// for one user does not block the others.
    pub async fn begin(&self, user_id: UserId) -> SessionController {
        let existing = self.get(user_id).await;
        if let Some(existing) = &existing {
            if existing.status().await != SessionStatus::Stopped {
                return existing.clone();
            }
        }

        let mut sessions = self.sessions.lock().await;
        match (sessions.get(&user_id), &existing) {
            // Replaced by a concurrent begin in the meantime.
            (Some(current), Some(stale)) if !current.same_session(stale) => current.clone(),
            (Some(current), None) => current.clone(),
            _ => {
                let controller =
                    SessionController::new(user_id, self.store.clone(), self.clock.clone());
                sessions.insert(user_id, controller.clone());
                controller
            }
        }
    }

    pub async fn get(&self, user_id: UserId) -> Option<SessionController> {
        self.sessions.lock().await.get(&user_id).cloned()
    }

    pub async fn end(&self, user_id: UserId) -> Option<SessionController> {
        self.sessions.lock().await.remove(&user_id)
    }
}
