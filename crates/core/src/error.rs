// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the lock API
//!
//! `lock`, `unlock` and `prune_expired` never return errors; store failures
//! go to the observer. Only deadline-bounded acquisition and configuration
//! validation are fallible.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock {name} not acquired after {attempts} attempts in {waited:?}")]
    DeadlineExceeded {
        name: String,
        attempts: u32,
        waited: Duration,
    },
    #[error("invalid lock config: {0}")]
    InvalidConfig(String),
}
