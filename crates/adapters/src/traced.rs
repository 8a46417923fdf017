// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use async_trait::async_trait;
use ddlock_core::{LockRecord, LockStore, StoreError};
use tracing::Instrument;

/// Wrapper that adds tracing to any LockStore
#[derive(Clone)]
pub struct TracedLockStore<S> {
    inner: S,
}

impl<S> TracedLockStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: LockStore> LockStore for TracedLockStore<S> {
    async fn create_if_absent(
        &self,
        name: &str,
        created: i64,
        ttl: i64,
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.create", name, created, ttl);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create_if_absent(name, created, ttl).await;
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "record created"),
                // Losing the race is the steady state under contention
                Err(e) if e.is_already_held() => tracing::debug!(elapsed_ms, "already held"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn read(&self, name: &str) -> Result<LockRecord, StoreError> {
        let span = tracing::debug_span!("store.read", name);
        async {
            let result = self.inner.read(name).await;

            match &result {
                Ok(record) => tracing::trace!(created = record.created, ttl = record.ttl, "read"),
                Err(e) if e.is_not_found() => tracing::trace!("no record"),
                Err(e) => tracing::error!(error = %e, "read failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.delete", name);
        async {
            let result = self.inner.delete(name).await;
            // delete() failing is retried by the caller, then left to the ttl
            match &result {
                Ok(()) => tracing::info!("record deleted"),
                Err(e) => tracing::warn!(error = %e, "delete failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
