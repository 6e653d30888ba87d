//! Readiness polling with a fixed interval
//!
//! A probe is attempted up to `max_attempts` times with `interval` between
//! failed attempts. There is no backoff: the waits covered here are service
//! cold starts with a short, known upper bound.

use crate::error::{ContainerError, Result};
use salesdash_core::RetryPolicy;
use std::future::Future;
use tokio::time::sleep;

/// Outcome of a readiness poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T = ()> {
    Ready { attempts: u32, value: T },
    TimedOut { attempts: u32 },
}

impl<T> Readiness<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            Readiness::Ready { attempts, .. } | Readiness::TimedOut { attempts } => *attempts,
        }
    }

    /// `TimedOut` becomes [`ContainerError::ReadinessTimeout`] for `target`
    pub fn into_result(self, target: &str) -> Result<T> {
        match self {
            Readiness::Ready { value, .. } => Ok(value),
            Readiness::TimedOut { attempts } => Err(ContainerError::ReadinessTimeout {
                target: target.to_string(),
                attempts,
            }),
        }
    }
}

/// Poll until `probe` yields a value or the attempts run out
///
/// Sleeps only between failed attempts, so a probe that succeeds on attempt
/// `k` returns after `(k - 1) * interval`.
pub async fn poll_for<T, F, Fut>(policy: &RetryPolicy, mut probe: F) -> Readiness<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = probe().await {
            tracing::debug!("ready after {} attempt(s)", attempt);
            return Readiness::Ready {
                attempts: attempt,
                value,
            };
        }

        if attempt < policy.max_attempts {
            sleep(policy.interval()).await;
        }
    }

    Readiness::TimedOut {
        attempts: policy.max_attempts,
    }
}

/// [`poll_for`] for a yes/no probe
pub async fn poll<F, Fut>(policy: &RetryPolicy, mut probe: F) -> Readiness
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_for(policy, || {
        let check = probe();
        async move { check.await.then_some(()) }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_kth_attempt() {
        let policy = RetryPolicy::new(30, 1_000);
        let start = Instant::now();
        let mut calls = 0;

        let readiness = poll(&policy, || {
            calls += 1;
            let ready = calls >= 4;
            async move { ready }
        })
        .await;

        assert_eq!(readiness, Readiness::Ready { attempts: 4, value: () });
        assert_eq!(calls, 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_immediately_does_not_sleep() {
        let policy = RetryPolicy::new(10, 2_000);
        let start = Instant::now();

        let readiness = poll(&policy, || async { true }).await;

        assert_eq!(readiness.attempts(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_after_max_attempts() {
        let policy = RetryPolicy::new(10, 2_000);
        let start = Instant::now();
        let mut calls = 0;

        let readiness = poll(&policy, || {
            calls += 1;
            async { false }
        })
        .await;

        assert_eq!(readiness, Readiness::TimedOut { attempts: 10 });
        assert_eq!(calls, 10);
        // no sleep after the final failure
        assert_eq!(start.elapsed(), Duration::from_secs(18));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_for_carries_value() {
        let policy = RetryPolicy::new(3, 100);
        let mut calls = 0;

        let readiness = poll_for(&policy, || {
            calls += 1;
            let value = (calls == 2).then(|| format!("body-{}", calls));
            async move { value }
        })
        .await;

        assert_eq!(readiness.into_result("dashboard").unwrap(), "body-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_error() {
        let policy = RetryPolicy::new(2, 10);
        let err = poll(&policy, || async { false })
            .await
            .into_result("sales-postgres")
            .unwrap_err();

        match err {
            ContainerError::ReadinessTimeout { target, attempts } => {
                assert_eq!(target, "sales-postgres");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
