// State Store Port (persistence adapter)

use crate::domain::QueueSnapshot;
use crate::error::Result;
use async_trait::async_trait;

/// Best-effort snapshot persistence for the whole queue
///
/// `save` is a full overwrite of the previous snapshot; there are no
/// incremental writes.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Overwrite the stored queue and counter
    async fn save(&self, snapshot: &QueueSnapshot) -> Result<()>;

    /// Load the stored state, `None` if nothing was ever saved
    async fn load(&self) -> Result<Option<QueueSnapshot>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store that can be told to fail writes
    #[derive(Default)]
    pub struct InMemoryStateStore {
        saved: Mutex<Option<QueueSnapshot>>,
        fail_saves: AtomicBool,
        save_count: AtomicUsize,
    }

    impl InMemoryStateStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_snapshot(snapshot: QueueSnapshot) -> Self {
            Self {
                saved: Mutex::new(Some(snapshot)),
                ..Self::default()
            }
        }

        pub fn set_fail_saves(&self, fail: bool) {
            self.fail_saves.store(fail, Ordering::SeqCst);
        }

        pub fn save_count(&self) -> usize {
            self.save_count.load(Ordering::SeqCst)
        }

        pub fn saved(&self) -> Option<QueueSnapshot> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StateStore for InMemoryStateStore {
        async fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(AppError::Database("storage unavailable".to_string()));
            }
            self.save_count.fetch_add(1, Ordering::SeqCst);
            *self.saved.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }

        async fn load(&self) -> Result<Option<QueueSnapshot>> {
            Ok(self.saved.lock().unwrap().clone())
        }
    }
}
