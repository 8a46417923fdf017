// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted lock record and the lock state derived from it

use crate::store::StoreError;
use serde::{Deserialize, Serialize};

/// The persisted representation of lock ownership.
///
/// One record exists per lock name while the lock is held. `created` is
/// written once at acquisition and never refreshed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Lock identity, the unique key in the store
    pub name: String,
    /// Seconds since the Unix epoch at acquisition
    pub created: i64,
    /// Seconds the holder is entitled to keep the lock
    pub ttl: i64,
}

impl LockRecord {
    pub fn new(name: impl Into<String>, created: i64, ttl: i64) -> Self {
        Self {
            name: name.into(),
            created,
            ttl,
        }
    }

    /// Epoch second after which the record counts as expired
    pub fn expires_at(&self) -> i64 {
        self.created.saturating_add(self.ttl)
    }

    /// True once `now - created > ttl`
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at() < now
    }

    /// Reject records that are missing any of their three fields.
    ///
    /// Stores that surface absent attributes as zero values or empty strings
    /// run reads through this before handing them to the mutex.
    pub fn validated(self) -> Result<Self, StoreError> {
        let missing = if self.name.is_empty() {
            Some("name")
        } else if self.created == 0 {
            Some("created")
        } else if self.ttl == 0 {
            Some("ttl")
        } else {
            None
        };

        match missing {
            Some(field) => Err(StoreError::Malformed {
                name: self.name,
                reason: format!("missing field `{field}`"),
            }),
            None => Ok(self),
        }
    }
}

/// Logical lock state as observed through the store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    /// No record exists
    Free,
    /// A record exists and has not expired
    Held,
    /// A record exists past its TTL and is eligible for reclamation
    Stale,
}

impl LockState {
    pub fn observe(record: Option<&LockRecord>, now: i64) -> Self {
        match record {
            None => LockState::Free,
            Some(r) if r.is_expired(now) => LockState::Stale,
            Some(_) => LockState::Held,
        }
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockState::Free => write!(f, "free"),
            LockState::Held => write!(f, "held"),
            LockState::Stale => write!(f, "stale"),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
