// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutex configuration and retry policy

use crate::error::LockError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of delete attempts `unlock` makes before relying on the TTL
pub const DEFAULT_RELEASE_ATTEMPTS: u32 = 3;

/// Delay between acquisition attempts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Same delay after every failed attempt
    Fixed {
        #[serde(with = "humantime_serde")]
        interval: Duration,
    },
    /// Delay doubles after every failed attempt, capped at `max`
    Exponential {
        #[serde(with = "humantime_serde")]
        initial: Duration,
        #[serde(with = "humantime_serde")]
        max: Duration,
    },
}

impl RetryPolicy {
    pub fn fixed(interval: Duration) -> Self {
        RetryPolicy::Fixed { interval }
    }

    pub fn exponential(initial: Duration, max: Duration) -> Self {
        RetryPolicy::Exponential { initial, max }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            RetryPolicy::Fixed { interval } => *interval,
            RetryPolicy::Exponential { initial, max } => {
                let shift = attempt.saturating_sub(1).min(31);
                initial
                    .checked_mul(1u32 << shift)
                    .map_or(*max, |d| d.min(*max))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::fixed(Duration::from_millis(500))
    }
}

/// Configuration for a single named mutex
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexConfig {
    /// Name identifying the lock in the store
    pub name: String,
    /// How long a holder is entitled to keep the lock
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Delete attempts made by `unlock` before giving up
    #[serde(default = "default_release_attempts")]
    pub release_attempts: u32,
}

fn default_release_attempts() -> u32 {
    DEFAULT_RELEASE_ATTEMPTS
}

impl MutexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            release_attempts: DEFAULT_RELEASE_ATTEMPTS,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_release_attempts(mut self, attempts: u32) -> Self {
        self.release_attempts = attempts;
        self
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, LockError> {
        let config: MutexConfig =
            toml::from_str(text).map_err(|e| LockError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LockError> {
        if self.name.is_empty() {
            return Err(LockError::InvalidConfig("name must not be empty".into()));
        }
        // Records store whole seconds; a sub-second TTL would persist as zero
        if self.ttl.as_secs() == 0 {
            return Err(LockError::InvalidConfig(format!(
                "ttl for {} must be at least one second",
                self.name
            )));
        }
        if self.release_attempts == 0 {
            return Err(LockError::InvalidConfig(format!(
                "release_attempts for {} must be at least 1",
                self.name
            )));
        }
        if let RetryPolicy::Exponential { initial, max } = &self.retry {
            if initial > max {
                return Err(LockError::InvalidConfig(format!(
                    "retry initial delay {initial:?} exceeds max {max:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
