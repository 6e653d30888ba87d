//! Readiness retry policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed-interval retry policy for readiness polling
///
/// YAML:
/// ```yaml
/// max_attempts: 30
/// interval_ms: 1000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            max_attempts,
            interval_ms,
        }
    }

    /// Database cold start: 30 attempts, one second apart
    pub const fn database() -> Self {
        Self::new(30, 1_000)
    }

    /// Dashboard fetch: 10 attempts, two seconds apart
    pub const fn fetch() -> Self {
        Self::new(10, 2_000)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Upper bound on the time spent sleeping when every attempt fails
    pub fn max_wait(&self) -> Duration {
        self.interval() * self.max_attempts.saturating_sub(1)
    }
}
