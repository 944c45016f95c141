// Application Layer - Use Cases (the controller the presentation layer drives)

pub mod queue_service;

// Re-exports
pub use queue_service::{call_announcement, QueueService};
