mod connection;
mod helpers;
mod memory;
mod migrations;
pub mod models;
mod repositories;
mod store;

pub use connection::Database;
pub use memory::MemoryStore;
pub use models::{TimeRecord, UserId};
pub use store::TimeStore;
