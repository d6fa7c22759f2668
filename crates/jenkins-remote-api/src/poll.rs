//! Fixed-interval polling for "wait until" style operations

use std::future::Future;
use std::time::Duration;

use crate::error::JenkinsResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
}

impl WaitOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, WaitOutcome::Satisfied)
    }
}

/// Wait policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Delay between predicate evaluations
    pub interval: Duration,
    /// `None` waits until the predicate holds
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
        }
    }
}

impl WaitPolicy {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Polls `predicate` until it returns `true` or the timeout elapses.
    ///
    /// A predicate error ends the wait immediately. Callers wanting
    /// cancellation can check their own signal inside the predicate.
    pub async fn wait_until<F, Fut>(&self, mut predicate: F) -> JenkinsResult<WaitOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = JenkinsResult<bool>>,
    {
        let started = tokio::time::Instant::now();

        loop {
            if predicate().await? {
                return Ok(WaitOutcome::Satisfied);
            }

            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    tracing::debug!(?timeout, "Wait timed out");
                    return Ok(WaitOutcome::TimedOut);
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use super::*;
    use crate::error::JenkinsError;

    fn fast(timeout: Option<Duration>) -> WaitPolicy {
        WaitPolicy::new(Duration::from_millis(5), timeout)
    }

    #[tokio::test]
    async fn test_wait_satisfied_after_a_few_polls() {
        let polls = AtomicUsize::new(0);
        let outcome = fast(Some(Duration::from_secs(5)))
            .wait_until(|| async { Ok(polls.fetch_add(1, Ordering::SeqCst) >= 2) })
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let outcome = fast(Some(Duration::from_millis(30)))
            .wait_until(|| async { Ok(false) })
            .await
            .unwrap();
        assert!(!outcome.is_satisfied());
    }

    #[tokio::test]
    async fn test_predicate_error_aborts() {
        let result = fast(None)
            .wait_until(|| async { Err(JenkinsError::Verification("boom".to_string())) })
            .await;
        assert!(matches!(result, Err(JenkinsError::Verification(_))));
    }

    #[test]
    fn test_default_policy() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.timeout, None);
    }
}
