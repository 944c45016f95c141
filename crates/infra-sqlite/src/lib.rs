// MediQueue Infrastructure - SQLite Adapter
// Implements: StateStore (local-storage style key/value snapshot)

mod connection;
mod migration;
pub mod record;
mod state_store;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use record::{StoredState, StoredTicket, LEGACY_ASSUMED_WAIT_MS};
pub use state_store::{SqliteStateStore, STATE_KEY};

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
