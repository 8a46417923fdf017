// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-memory store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LockStore, StoreError};
use crate::record::LockRecord;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create { name: String, created: i64, ttl: i64 },
    Read { name: String },
    Delete { name: String },
}

#[derive(Default)]
struct FakeState {
    records: HashMap<String, LockRecord>,
    calls: Vec<StoreCall>,
    create_script: VecDeque<Result<(), StoreError>>,
    read_script: VecDeque<Result<LockRecord, StoreError>>,
    delete_script: VecDeque<Result<(), StoreError>>,
    delete_failure: Option<StoreError>,
}

/// Fake store that behaves like a correct in-memory store unless scripted.
///
/// Scripted results are consumed in order, one per call. A scripted error
/// leaves the stored records untouched; a scripted success applies the
/// operation as the real store would.
#[derive(Clone, Default)]
pub struct FakeLockStore {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Seed a record directly, bypassing the conditional create
    pub fn insert(&self, record: LockRecord) {
        self.with_state(|s| {
            s.records.insert(record.name.clone(), record);
        });
    }

    /// Current record for a name
    pub fn get(&self, name: &str) -> Option<LockRecord> {
        self.with_state(|s| s.records.get(name).cloned())
    }

    /// Queue the result of the next unscripted `create_if_absent`
    pub fn push_create(&self, result: Result<(), StoreError>) {
        self.with_state(|s| s.create_script.push_back(result));
    }

    /// Queue the result of the next unscripted `read`
    pub fn push_read(&self, result: Result<LockRecord, StoreError>) {
        self.with_state(|s| s.read_script.push_back(result));
    }

    /// Queue the result of the next unscripted `delete`
    pub fn push_delete(&self, result: Result<(), StoreError>) {
        self.with_state(|s| s.delete_script.push_back(result));
    }

    /// Make every delete fail with `err` until cleared with `None`
    pub fn fail_deletes(&self, err: Option<StoreError>) {
        self.with_state(|s| s.delete_failure = err);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Create { .. }))
            .count()
    }

    pub fn read_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Read { .. }))
            .count()
    }

    pub fn delete_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Delete { .. }))
            .count()
    }
}

#[async_trait]
impl LockStore for FakeLockStore {
    async fn create_if_absent(
        &self,
        name: &str,
        created: i64,
        ttl: i64,
    ) -> Result<(), StoreError> {
        self.with_state(|s| {
            s.calls.push(StoreCall::Create {
                name: name.to_string(),
                created,
                ttl,
            });

            match s.create_script.pop_front() {
                Some(Err(e)) => return Err(e),
                Some(Ok(())) => {}
                None if s.records.contains_key(name) => {
                    return Err(StoreError::AlreadyHeld(name.to_string()));
                }
                None => {}
            }

            s.records
                .insert(name.to_string(), LockRecord::new(name, created, ttl));
            Ok(())
        })
    }

    async fn read(&self, name: &str) -> Result<LockRecord, StoreError> {
        self.with_state(|s| {
            s.calls.push(StoreCall::Read {
                name: name.to_string(),
            });

            if let Some(result) = s.read_script.pop_front() {
                return result;
            }
            s.records
                .get(name)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(name.to_string()))
        })
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.with_state(|s| {
            s.calls.push(StoreCall::Delete {
                name: name.to_string(),
            });

            if let Some(err) = &s.delete_failure {
                return Err(err.clone());
            }
            if let Some(Err(e)) = s.delete_script.pop_front() {
                return Err(e);
            }
            s.records.remove(name);
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
