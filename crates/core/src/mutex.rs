// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-backed mutual exclusion lock
//!
//! A [`Mutex`] is a descriptor, not a holder of state: the lock lives in the
//! store as a [`LockRecord`](crate::record::LockRecord) keyed by name. The
//! observable states are:
//!
//! - **Free**: no record
//! - **Held**: record exists and `now - created <= ttl`
//! - **Stale**: record exists past its TTL, reclaimed by the next `prune_expired`
//!
//! Exclusivity is decided entirely by the store's conditional create. The
//! polling loop here only governs liveness, and gives no fairness among
//! waiters.

use crate::clock::{Clock, SystemClock};
use crate::config::{RetryPolicy, DEFAULT_RELEASE_ATTEMPTS};
use crate::error::LockError;
use crate::observer::{LockEvent, SharedObserver, TracingObserver};
use crate::record::LockState;
use crate::store::{LockStore, StoreError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A mutual exclusion lock whose state is held in a [`LockStore`]
#[derive(Clone)]
pub struct Mutex<S, C = SystemClock> {
    name: String,
    ttl: Duration,
    retry: RetryPolicy,
    release_attempts: u32,
    store: S,
    clock: C,
    observer: SharedObserver,
}

impl<S> Mutex<S, SystemClock>
where
    S: LockStore,
{
    /// Create a mutex on the system clock with a fixed retry interval
    pub fn new(name: impl Into<String>, ttl: Duration, store: S, retry_interval: Duration) -> Self {
        Self::with_clock(name, ttl, store, retry_interval, SystemClock)
    }
}

impl<S, C> Mutex<S, C>
where
    S: LockStore,
    C: Clock,
{
    pub fn with_clock(
        name: impl Into<String>,
        ttl: Duration,
        store: S,
        retry_interval: Duration,
        clock: C,
    ) -> Self {
        Self {
            name: name.into(),
            ttl,
            retry: RetryPolicy::fixed(retry_interval),
            release_attempts: DEFAULT_RELEASE_ATTEMPTS,
            store,
            clock,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_release_attempts(mut self, attempts: u32) -> Self {
        self.release_attempts = attempts.max(1);
        self
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn release_attempts(&self) -> u32 {
        self.release_attempts
    }

    /// TTL in the whole seconds stored on the record.
    ///
    /// Rounds up and never goes below one second: a zero TTL reads back as a
    /// malformed record, which prune would never reclaim.
    fn ttl_secs(&self) -> i64 {
        let secs = if self.ttl.subsec_nanos() > 0 {
            self.ttl.as_secs().saturating_add(1)
        } else {
            self.ttl.as_secs()
        };
        i64::try_from(secs.max(1)).unwrap_or(i64::MAX)
    }

    /// Block until the lock is acquired.
    ///
    /// Each attempt first reclaims a stale record, then tries the conditional
    /// create. Failures of any kind are reported to the observer and retried
    /// after the retry policy's delay; there is no deadline.
    pub async fn lock(&self) {
        // Without a deadline the loop only exits on a successful create
        let _ = self.acquire(None).await;
    }

    /// Like [`lock`](Self::lock), but give up once `deadline` has elapsed.
    ///
    /// At least one attempt is made. The final attempt happens at or after
    /// the deadline, so an `Err` means the lock is not held by this caller.
    pub async fn lock_within(&self, deadline: Duration) -> Result<(), LockError> {
        self.acquire(Some(deadline)).await
    }

    /// Make a single acquisition attempt without waiting
    pub async fn try_lock(&self) -> bool {
        self.attempt(1).await
    }

    async fn acquire(&self, deadline: Option<Duration>) -> Result<(), LockError> {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            if self.attempt(attempt).await {
                return Ok(());
            }

            let mut delay = self.retry.delay(attempt);
            if let Some(deadline) = deadline {
                let waited = start.elapsed();
                if waited >= deadline {
                    self.observer.on_event(&LockEvent::DeadlineExceeded {
                        name: self.name.clone(),
                        attempts: attempt,
                        waited,
                    });
                    return Err(LockError::DeadlineExceeded {
                        name: self.name.clone(),
                        attempts: attempt,
                        waited,
                    });
                }
                delay = delay.min(deadline - waited);
            }

            tokio::time::sleep(delay).await;
        }
    }

    /// Prune, then try the conditional create once
    async fn attempt(&self, attempt: u32) -> bool {
        self.prune_expired().await;

        let created = self.clock.now_secs();
        match self
            .store
            .create_if_absent(&self.name, created, self.ttl_secs())
            .await
        {
            Ok(()) => {
                self.observer.on_event(&LockEvent::Acquired {
                    name: self.name.clone(),
                    attempts: attempt,
                });
                true
            }
            Err(e) if e.is_already_held() => {
                self.observer.on_event(&LockEvent::Contended {
                    name: self.name.clone(),
                    attempt,
                });
                false
            }
            Err(e) => {
                self.observer.on_event(&LockEvent::AcquireFailed {
                    name: self.name.clone(),
                    attempt,
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Release the lock, best effort.
    ///
    /// Tries the delete up to `release_attempts` times. If every attempt
    /// fails the lock is left for its TTL to expire; the caller is never
    /// blocked or handed an error.
    pub async fn unlock(&self) {
        self.delete_with_retry().await;
    }

    async fn delete_with_retry(&self) -> bool {
        for attempt in 1..=self.release_attempts {
            match self.store.delete(&self.name).await {
                Ok(()) => {
                    self.observer.on_event(&LockEvent::Released {
                        name: self.name.clone(),
                    });
                    return true;
                }
                // Already gone is what a release wants
                Err(e) if e.is_not_found() => {
                    self.observer.on_event(&LockEvent::Released {
                        name: self.name.clone(),
                    });
                    return true;
                }
                Err(e) => self.observer.on_event(&LockEvent::ReleaseFailed {
                    name: self.name.clone(),
                    attempt,
                    error: e.to_string(),
                }),
            }
        }

        self.observer.on_event(&LockEvent::ReleaseAbandoned {
            name: self.name.clone(),
            attempts: self.release_attempts,
        });
        false
    }

    /// Delete the record if its holder's TTL has lapsed.
    ///
    /// Read failures are reported and otherwise ignored, so a flaky store
    /// never blocks the caller here.
    pub async fn prune_expired(&self) {
        let record = match self.store.read(&self.name).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                self.observer.on_event(&LockEvent::PruneFailed {
                    name: self.name.clone(),
                    error: e.to_string(),
                });
                return;
            }
        };

        if record.is_expired(self.clock.now_secs()) {
            self.observer.on_event(&LockEvent::StaleReclaimed {
                name: self.name.clone(),
                created: record.created,
                ttl: record.ttl,
            });
            self.delete_with_retry().await;
        }
    }

    /// Read the lock's current state from the store
    pub async fn state(&self) -> Result<LockState, StoreError> {
        let now = self.clock.now_secs();
        match self.store.read(&self.name).await {
            Ok(record) => Ok(LockState::observe(Some(&record), now)),
            Err(e) if e.is_not_found() => Ok(LockState::Free),
            Err(e) => Err(e),
        }
    }

    /// Run `f` while holding the lock, releasing it afterwards
    pub async fn run_locked<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.lock().await;
        let output = f().await;
        self.unlock().await;
        output
    }
}

impl<S, C> std::fmt::Debug for Mutex<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutex")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("retry", &self.retry)
            .field("release_attempts", &self.release_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "mutex_tests.rs"]
mod tests;
