// Announcer Port (voice / visual announcement sink)

use async_trait::async_trait;
use thiserror::Error;

/// Announcement errors
#[derive(Error, Debug)]
pub enum AnnounceError {
    #[error("Speech output unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Announcement sink
///
/// Fire-and-forget: `announce` returns once the message is handed off, not
/// when it finishes playing. A new announcement supersedes one still in
/// flight (last call wins).
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, message: &str) -> Result<(), AnnounceError>;
}

/// Announcer that drops every message
pub struct SilentAnnouncer;

#[async_trait]
impl Announcer for SilentAnnouncer {
    async fn announce(&self, message: &str) -> Result<(), AnnounceError> {
        tracing::debug!(message = %message, "Announcement suppressed (silent mode)");
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every message; optionally fails like a missing speech engine
    #[derive(Default)]
    pub struct RecordingAnnouncer {
        messages: Mutex<Vec<String>>,
        unavailable: bool,
    }

    impl RecordingAnnouncer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn new_unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Announcer for RecordingAnnouncer {
        async fn announce(&self, message: &str) -> Result<(), AnnounceError> {
            self.messages.lock().unwrap().push(message.to_string());
            if self.unavailable {
                return Err(AnnounceError::Unavailable("no speech engine".to_string()));
            }
            Ok(())
        }
    }
}
