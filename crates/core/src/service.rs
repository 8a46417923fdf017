// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Factory for mutexes bound to one store

use crate::clock::{Clock, SystemClock};
use crate::config::MutexConfig;
use crate::error::LockError;
use crate::mutex::Mutex;
use crate::observer::{SharedObserver, TracingObserver};
use crate::store::LockStore;
use std::sync::Arc;
use std::time::Duration;

/// Mints [`Mutex`] descriptors over a shared store handle.
///
/// Holds no state beyond the store, clock and observer, and performs no I/O
/// when creating locks.
#[derive(Clone)]
pub struct LockService<S, C = SystemClock> {
    store: S,
    clock: C,
    observer: SharedObserver,
}

impl<S: LockStore> LockService<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
            observer: Arc::new(TracingObserver),
        }
    }
}

impl<S: LockStore, C: Clock> LockService<S, C> {
    /// Use a different clock for the locks created from here on
    pub fn with_clock<C2: Clock>(self, clock: C2) -> LockService<S, C2> {
        LockService {
            store: self.store,
            clock,
            observer: self.observer,
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a lock with a fixed retry interval
    pub fn new_lock(
        &self,
        name: impl Into<String>,
        ttl: Duration,
        retry_interval: Duration,
    ) -> Mutex<S, C> {
        Mutex::with_clock(
            name,
            ttl,
            self.store.clone(),
            retry_interval,
            self.clock.clone(),
        )
        .with_observer(self.observer.clone())
    }

    /// Create a lock from a validated config
    pub fn lock_from_config(&self, config: &MutexConfig) -> Result<Mutex<S, C>, LockError> {
        config.validate()?;
        Ok(self
            .new_lock(config.name.clone(), config.ttl, Duration::ZERO)
            .with_retry(config.retry.clone())
            .with_release_attempts(config.release_attempts))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
