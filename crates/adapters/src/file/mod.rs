// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed lock store
//!
//! Each lock is one JSON file, `<dir>/<encoded name>.lock`, so processes on
//! different machines can coordinate through a shared filesystem. The
//! conditional create writes the record to a private temp file and then
//! hard-links it into place: the link fails if the target exists, and
//! readers never observe a half-written record.
//!
//! A process killed between writing and removing its temp file leaves it
//! behind. [`FileLockStore::open`] sweeps temp files older than a minute.

use async_trait::async_trait;
use ddlock_core::{LockRecord, LockStore, StoreError};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const RECORD_EXTENSION: &str = "lock";
const TEMP_EXTENSION: &str = "tmp";

/// Temp files younger than this may belong to a create still in flight
const TEMP_MAX_AGE: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct FileLockStore {
    dir: PathBuf,
}

/// On-disk record as read back; any field may be missing
#[derive(Deserialize)]
struct StoredRecord {
    name: Option<String>,
    created: Option<i64>,
    ttl: Option<i64>,
}

impl FileLockStore {
    /// Use `dir` for lock records. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Use `dir` for lock records, creating it if needed.
    ///
    /// Also removes temp files abandoned by crashed writers. Sweep failures
    /// are logged and never fail the open.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        let store = Self { dir };
        store.sweep_temp_files(TEMP_MAX_AGE).await;
        Ok(store)
    }

    /// Remove temp files last modified more than `max_age` ago
    async fn sweep_temp_files(&self, max_age: Duration) {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "failed to scan for temp records");
                return;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0usize;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "temp record scan aborted");
                    break;
                }
            };
            if !is_temp_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let path = entry.path();
            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping temp record");
                    continue;
                }
            };
            // Future mtimes (clock skew) count as fresh
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= max_age {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "failed to remove stale temp record");
                }
            }
        }

        if removed > 0 {
            tracing::info!(dir = %self.dir.display(), removed, "removed abandoned temp records");
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `name`
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_name(name), RECORD_EXTENSION))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!(".{}.{}.{}", encode_name(name), Uuid::new_v4(), TEMP_EXTENSION))
    }

    async fn write_temp(&self, path: &Path, body: &[u8]) -> Result<(), StoreError> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(body).await?;
        file.sync_all().await?;
        Ok(())
    }
}

/// Encode a lock name as a file stem.
///
/// Bytes outside `[A-Za-z0-9_-]` become `%XX`, which keeps distinct names
/// distinct and rules out separators and `..`.
pub fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn is_temp_file(file_name: &str) -> bool {
    file_name.starts_with('.')
        && file_name
            .strip_suffix(TEMP_EXTENSION)
            .is_some_and(|stem| stem.ends_with('.'))
}

fn parse_record(name: &str, body: &str) -> Result<LockRecord, StoreError> {
    let malformed = |reason: String| StoreError::Malformed {
        name: name.to_string(),
        reason,
    };

    let stored: StoredRecord = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let record = LockRecord {
        name: stored.name.unwrap_or_default(),
        created: stored.created.unwrap_or_default(),
        ttl: stored.ttl.unwrap_or_default(),
    }
    .validated()?;

    if record.name != name {
        return Err(malformed(format!("record is for {}", record.name)));
    }
    Ok(record)
}

#[async_trait]
impl LockStore for FileLockStore {
    async fn create_if_absent(
        &self,
        name: &str,
        created: i64,
        ttl: i64,
    ) -> Result<(), StoreError> {
        let record = LockRecord::new(name, created, ttl);
        let body = serde_json::to_vec(&record).map_err(|e| StoreError::Io(e.to_string()))?;

        let temp = self.temp_path(name);
        if let Err(e) = self.write_temp(&temp, &body).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        let linked = tokio::fs::hard_link(&temp, self.record_path(name)).await;
        if let Err(e) = tokio::fs::remove_file(&temp).await {
            tracing::debug!(path = %temp.display(), error = %e, "failed to remove temp record");
        }

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyHeld(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, name: &str) -> Result<LockRecord, StoreError> {
        match tokio::fs::read_to_string(self.record_path(name)).await {
            Ok(body) => parse_record(name, &body),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.record_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
