pub mod commands;
pub mod controller;
pub mod registry;
pub mod state;

pub use controller::{FinishedSession, SessionController, SessionSnapshot};
pub use registry::SessionRegistry;
pub use state::{ClosedSpan, SessionState, SessionStatus};
