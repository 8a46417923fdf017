// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! ddlock-core: distributed mutual exclusion over a key-value store
//!
//! This crate provides:
//! - The persisted lock record and its derived Free/Held/Stale state
//! - The `LockStore` contract a backing store must satisfy
//! - The `Mutex` state machine (lock, unlock, prune expired)
//! - `LockService`, a factory binding mutexes to one store
//! - An injectable observer for failures the lock API never returns

pub mod clock;
pub mod config;
pub mod error;
pub mod mutex;
pub mod observer;
pub mod record;
pub mod service;
pub mod store;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{MutexConfig, RetryPolicy, DEFAULT_RELEASE_ATTEMPTS};
pub use error::LockError;
pub use mutex::Mutex;
pub use observer::{FnObserver, LockEvent, LockObserver, SharedObserver, TracingObserver};
pub use record::{LockRecord, LockState};
pub use service::LockService;
pub use store::{LockStore, StoreError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use observer::RecordingObserver;
#[cfg(any(test, feature = "test-support"))]
pub use store::{FakeLockStore, StoreCall};
