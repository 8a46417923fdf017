// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value store contract consumed by the mutex
//!
//! A store maps each lock name onto a single record. The mutex is only as
//! correct as `create_if_absent`: it must be atomic and strongly consistent
//! at the store, since it is the sole point where exclusivity is decided.

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLockStore, StoreCall};

use crate::record::LockRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from store operations
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Conditional create lost: a record for the name already exists
    #[error("lock already held: {0}")]
    AlreadyHeld(String),
    /// No record exists for the name
    #[error("no lock record for name: {0}")]
    NotFound(String),
    /// A record exists but is missing one of its fields
    #[error("malformed lock record {name}: {reason}")]
    Malformed { name: String, reason: String },
    /// The store could not be reached or rejected the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(String),
}

impl StoreError {
    /// Expected outcome under contention, never an operational failure
    pub fn is_already_held(&self) -> bool {
        matches!(self, StoreError::AlreadyHeld(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Adapter for the store holding lock records
///
/// Implementations must be safe to call concurrently; the mutex adds no
/// synchronization of its own.
#[async_trait]
pub trait LockStore: Clone + Send + Sync + 'static {
    /// Write a record only if none exists for `name`.
    ///
    /// Fails with [`StoreError::AlreadyHeld`] when the record exists.
    async fn create_if_absent(&self, name: &str, created: i64, ttl: i64)
        -> Result<(), StoreError>;

    /// Strongly consistent read of the record for `name`.
    ///
    /// Fails with [`StoreError::NotFound`] when no record exists and
    /// [`StoreError::Malformed`] when the stored record is incomplete.
    async fn read(&self, name: &str) -> Result<LockRecord, StoreError>;

    /// Remove the record for `name`. Removing an absent record succeeds.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}
