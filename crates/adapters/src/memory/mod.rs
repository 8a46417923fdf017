// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lock store
//!
//! Coordinates tasks and threads within one process. Every clone shares the
//! same record table.

use async_trait::async_trait;
use ddlock_core::{LockRecord, LockStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryLockStore {
    records: Arc<Mutex<HashMap<String, LockRecord>>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a record unconditionally, replacing any existing one
    pub fn put(&self, record: LockRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.name.clone(), record);
    }

    /// Names of all current records, sorted
    pub fn names(&self) -> Vec<String> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<_> = records.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn create_if_absent(
        &self,
        name: &str,
        created: i64,
        ttl: i64,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.contains_key(name) {
            return Err(StoreError::AlreadyHeld(name.to_string()));
        }
        records.insert(name.to_string(), LockRecord::new(name, created, ttl));
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<LockRecord, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let record = records
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        record.validated()
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
