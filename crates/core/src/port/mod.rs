// Port Layer - Interfaces for external collaborators

pub mod announcer;
pub mod state_store;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use announcer::{AnnounceError, Announcer};
pub use state_store::StateStore;
pub use time_provider::TimeProvider;
