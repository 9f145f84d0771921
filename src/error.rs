use thiserror::Error;

use crate::timer::SessionStatus;

/// Fields of a time record a user can edit by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditedField {
    Start,
    End,
    Pause,
}

impl EditedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditedField::Start => "start",
            EditedField::End => "end",
            EditedField::Pause => "pause",
        }
    }
}

impl std::fmt::Display for EditedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("cannot {action} while the session is {status:?}")]
    IllegalTransition {
        action: &'static str,
        status: SessionStatus,
    },

    #[error("start must be strictly before end")]
    InvalidRange,

    #[error("pause of {pause_ms} ms exceeds the recorded span of {span_ms} ms")]
    PauseExceedsSpan { pause_ms: u64, span_ms: u64 },

    #[error("{0} lies in the future")]
    FutureTimestamp(EditedField),

    #[error("{0} is required")]
    MissingField(EditedField),

    #[error("interval overlaps another time record")]
    OverlappingInterval,

    #[error("time record {0} not found")]
    NotFound(String),

    #[error("record store failure: {0:#}")]
    StoreFailure(#[from] anyhow::Error),
}

impl TrackerError {
    /// Validation and state errors are the caller's to fix; store failures are not.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, TrackerError::StoreFailure(_))
    }

    /// Text handed back to a host. Store failures are logged and flagged as
    /// worth retrying; everything else is shown as is.
    pub fn into_message(self) -> String {
        if self.is_user_error() {
            return self.to_string();
        }
        log::error!("{self}");
        format!("{self}; please try again")
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
