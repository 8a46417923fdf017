// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable sink for lock lifecycle events
//!
//! The mutex never returns store failures to its caller. Instead every
//! notable outcome is handed to a [`LockObserver`], which by default writes
//! it to `tracing`.

use std::sync::Arc;
use std::time::Duration;

/// Something that happened while acquiring, releasing or pruning a lock
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockEvent {
    Acquired {
        name: String,
        attempts: u32,
    },
    /// Conditional create lost to another holder
    Contended {
        name: String,
        attempt: u32,
    },
    AcquireFailed {
        name: String,
        attempt: u32,
        error: String,
    },
    DeadlineExceeded {
        name: String,
        attempts: u32,
        waited: Duration,
    },
    Released {
        name: String,
    },
    ReleaseFailed {
        name: String,
        attempt: u32,
        error: String,
    },
    /// All delete attempts failed; the record stays until its TTL lapses
    ReleaseAbandoned {
        name: String,
        attempts: u32,
    },
    PruneFailed {
        name: String,
        error: String,
    },
    StaleReclaimed {
        name: String,
        created: i64,
        ttl: i64,
    },
}

impl LockEvent {
    /// Get the event name for pattern matching
    pub fn name(&self) -> &'static str {
        match self {
            LockEvent::Acquired { .. } => "lock:acquired",
            LockEvent::Contended { .. } => "lock:contended",
            LockEvent::AcquireFailed { .. } => "lock:acquire_failed",
            LockEvent::DeadlineExceeded { .. } => "lock:deadline_exceeded",
            LockEvent::Released { .. } => "lock:released",
            LockEvent::ReleaseFailed { .. } => "lock:release_failed",
            LockEvent::ReleaseAbandoned { .. } => "lock:release_abandoned",
            LockEvent::PruneFailed { .. } => "lock:prune_failed",
            LockEvent::StaleReclaimed { .. } => "lock:stale_reclaimed",
        }
    }

    /// Name of the lock the event concerns
    pub fn lock_name(&self) -> &str {
        match self {
            LockEvent::Acquired { name, .. }
            | LockEvent::Contended { name, .. }
            | LockEvent::AcquireFailed { name, .. }
            | LockEvent::DeadlineExceeded { name, .. }
            | LockEvent::Released { name }
            | LockEvent::ReleaseFailed { name, .. }
            | LockEvent::ReleaseAbandoned { name, .. }
            | LockEvent::PruneFailed { name, .. }
            | LockEvent::StaleReclaimed { name, .. } => name,
        }
    }

    /// True for events that report an operational failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            LockEvent::AcquireFailed { .. }
                | LockEvent::ReleaseFailed { .. }
                | LockEvent::ReleaseAbandoned { .. }
                | LockEvent::PruneFailed { .. }
        )
    }
}

/// Receives lock events
pub trait LockObserver: Send + Sync + 'static {
    fn on_event(&self, event: &LockEvent);
}

fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Observer that writes events to `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl LockObserver for TracingObserver {
    fn on_event(&self, event: &LockEvent) {
        match event {
            LockEvent::Acquired { name, attempts } => {
                tracing::debug!(name = %name, attempts, "lock acquired")
            }
            LockEvent::Contended { name, attempt } => {
                tracing::trace!(name = %name, attempt, "lock held elsewhere")
            }
            LockEvent::AcquireFailed {
                name,
                attempt,
                error,
            } => tracing::warn!(name = %name, attempt, error = %error, "lock attempt failed"),
            LockEvent::DeadlineExceeded {
                name,
                attempts,
                waited,
            } => tracing::warn!(
                name = %name,
                attempts,
                waited_ms = saturating_millis(*waited),
                "lock not acquired before deadline"
            ),
            LockEvent::Released { name } => tracing::debug!(name = %name, "lock released"),
            LockEvent::ReleaseFailed {
                name,
                attempt,
                error,
            } => tracing::warn!(name = %name, attempt, error = %error, "unlock attempt failed"),
            LockEvent::ReleaseAbandoned { name, attempts } => tracing::warn!(
                name = %name,
                attempts,
                "unlock abandoned, record will expire by ttl"
            ),
            LockEvent::PruneFailed { name, error } => {
                tracing::warn!(name = %name, error = %error, "prune read failed")
            }
            LockEvent::StaleReclaimed { name, created, ttl } => {
                tracing::info!(name = %name, created, ttl, "reclaiming stale lock")
            }
        }
    }
}

/// Observer that forwards to a closure
pub struct FnObserver<F>(pub F);

impl<F> LockObserver for FnObserver<F>
where
    F: Fn(&LockEvent) + Send + Sync + 'static,
{
    fn on_event(&self, event: &LockEvent) {
        (self.0)(event)
    }
}

/// Observer that records every event, for tests
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<std::sync::Mutex<Vec<LockEvent>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded events
    pub fn events(&self) -> Vec<LockEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Names of recorded events, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(LockEvent::name).collect()
    }

    pub fn failures(&self) -> Vec<LockEvent> {
        self.events().into_iter().filter(LockEvent::is_failure).collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl LockObserver for RecordingObserver {
    fn on_event(&self, event: &LockEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

/// Shared handle to an observer
pub type SharedObserver = Arc<dyn LockObserver>;

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
