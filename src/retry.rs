//! Bounded retries, exponential backoff and stage timeouts.

use crate::error::{Result, SkrivError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded attempt count with exponential backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Cap for the doubling delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Delay to wait after attempt number `attempt` (1-based) failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Sum of the delays slept across all attempts.
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts).map(|attempt| self.delay_for(attempt)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500), Duration::from_secs(4))
    }
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out.
///
/// Only errors for which [`SkrivError::is_transient`] holds are retried.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let backoff = policy.delay_for(attempt);
                warn!(
                    "{} attempt {}/{} failed: {}; retrying in {:?}",
                    label, attempt, policy.max_attempts, e, backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Bound a future by `limit`, reporting expiry as [`SkrivError::Timeout`].
pub async fn with_timeout<T, Fut>(limit: Duration, label: &str, future: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(SkrivError::Timeout(format!("{label} after {limit:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(30), Duration::from_millis(350));
    }

    #[test]
    fn test_total_delay() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.total_delay(), Duration::from_millis(650));
        assert_eq!(RetryPolicy::new(1, Duration::from_secs(1), Duration::from_secs(1)).total_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry(&fast_policy(3), "title lookup", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(SkrivError::Timeout("lookup".into()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&fast_policy(2), "download", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SkrivError::ToolFailed("yt-dlp".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&fast_policy(5), "transcription", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SkrivError::Config("no key".into()))
        })
        .await;

        assert!(matches!(result, Err(SkrivError::Config(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_reports_label() {
        let result: Result<()> = with_timeout(Duration::from_millis(5), "summarization", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(SkrivError::Timeout(msg)) => assert!(msg.starts_with("summarization")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
