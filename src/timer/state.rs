use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::UserId,
    duration::{gross_duration, span_ms},
    error::{TrackerError, TrackerResult},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    /// Terminal. A stopped session is never restarted.
    Stopped,
}

/// Interval handed to the store when a session stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub pause_ms: u64,
}

impl ClosedSpan {
    /// `end - start - pause`, the net working time of the session.
    pub fn working_ms(&self) -> u64 {
        span_ms(self.start, self.end).saturating_sub(self.pause_ms)
    }
}

/// Live state of one tracking attempt.
///
/// Transitions are pure functions of `now`; the controller supplies the
/// clock and does the persisting. A rejected transition leaves every field
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub user_id: UserId,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    /// Sum of closed pause spans.
    pub pause_accumulated_ms: u64,
    /// Set while paused; folded into `pause_accumulated_ms` on resume or stop.
    pub pause_started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            status: SessionStatus::Idle,
            started_at: None,
            pause_accumulated_ms: 0,
            pause_started_at: None,
        }
    }

    fn reject(&self, action: &'static str) -> TrackerError {
        TrackerError::IllegalTransition {
            action,
            status: self.status,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> TrackerResult<()> {
        if self.status != SessionStatus::Idle {
            return Err(self.reject("start"));
        }
        self.started_at = Some(now);
        self.status = SessionStatus::Running;
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> TrackerResult<()> {
        if self.status != SessionStatus::Running {
            return Err(self.reject("pause"));
        }
        self.pause_started_at = Some(now);
        self.status = SessionStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> TrackerResult<()> {
        if self.status != SessionStatus::Paused {
            return Err(self.reject("resume"));
        }
        self.fold_open_pause(now);
        self.status = SessionStatus::Running;
        Ok(())
    }

    /// Computes the span a stop at `now` would persist, without changing state.
    ///
    /// Fails with `InvalidRange` unless `now` lies strictly after the start.
    pub fn closing_span(&self, now: DateTime<Utc>) -> TrackerResult<ClosedSpan> {
        let started_at = match (self.status, self.started_at) {
            (SessionStatus::Running | SessionStatus::Paused, Some(started_at)) => started_at,
            _ => return Err(self.reject("stop")),
        };
        gross_duration(started_at, now)?;
        Ok(ClosedSpan {
            start: started_at,
            end: now,
            pause_ms: self.paused_ms_at(now),
        })
    }

    /// Marks the session finished. Call only once `closing_span` has been persisted.
    pub fn finish(&mut self, span: &ClosedSpan) {
        self.pause_accumulated_ms = span.pause_ms;
        self.pause_started_at = None;
        self.status = SessionStatus::Stopped;
    }

    /// Ends a running or paused session without producing a record.
    pub fn discard(&mut self) -> TrackerResult<()> {
        if !self.is_active() {
            return Err(self.reject("discard"));
        }
        self.pause_started_at = None;
        self.status = SessionStatus::Stopped;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Running | SessionStatus::Paused)
    }

    /// Pause time including a still-open pause span.
    pub fn paused_ms_at(&self, now: DateTime<Utc>) -> u64 {
        let open = match (self.status, self.pause_started_at) {
            (SessionStatus::Paused, Some(since)) => span_ms(since, now),
            _ => 0,
        };
        self.pause_accumulated_ms.saturating_add(open)
    }

    /// Working time so far.
    pub fn elapsed_ms_at(&self, now: DateTime<Utc>) -> u64 {
        match (self.is_active(), self.started_at) {
            (true, Some(started_at)) => {
                span_ms(started_at, now).saturating_sub(self.paused_ms_at(now))
            }
            _ => 0,
        }
    }

    fn fold_open_pause(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.pause_started_at.take() {
            self.pause_accumulated_ms = self.pause_accumulated_ms.saturating_add(span_ms(since, now));
        }
    }
}
