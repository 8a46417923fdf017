//! Shared helpers for behavioral specs

pub use ddlock_adapters::{FileLockStore, MemoryLockStore, TracedLockStore};
pub use ddlock_core::{
    Clock, FakeClock, FakeLockStore, LockError, LockEvent, LockRecord, LockService, LockState,
    LockStore, MutexConfig, RecordingObserver, RetryPolicy, StoreError,
};
pub use std::sync::atomic::{AtomicUsize, Ordering};
pub use std::sync::Arc;
pub use std::time::Duration;
pub use tempfile::TempDir;

pub const RETRY: Duration = Duration::from_millis(5);

/// Tracks how many contenders are inside a critical section at once
#[derive(Clone, Default)]
pub struct Occupancy {
    inside: Arc<AtomicUsize>,
    max_inside: Arc<AtomicUsize>,
    entries: Arc<AtomicUsize>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupy the critical section for `hold`
    pub async fn enter(&self, hold: Duration) {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inside.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(hold).await;
        self.inside.fetch_sub(1, Ordering::SeqCst);
        self.entries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn max_inside(&self) -> usize {
        self.max_inside.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }
}

/// A directory standing in for storage shared between processes
pub struct SharedDir {
    dir: TempDir,
}

impl SharedDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// A store handle as an independent process would open it
    pub fn store(&self) -> FileLockStore {
        FileLockStore::new(self.dir.path())
    }
}
