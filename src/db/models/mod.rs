pub mod time_record;

pub use time_record::{TimeRecord, UserId};
