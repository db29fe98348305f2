//! One retry engine for every summarizer call.
//!
//! Callers supply the operation and a classifier deciding, per error,
//! whether to back off, retry at once, or give up. Rate-limit backoff
//! doubles from `base_delay` on each retry.

use std::future::Future;
use std::time::Duration;

use memoir_domain::config::HistoryConfig;
use memoir_domain::error::{Error, Result};
use memoir_domain::trace::TraceEvent;

use crate::cancel::CancelToken;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Wait out the backoff schedule, then retry.
    Backoff,
    /// Retry without waiting.
    Immediate,
    /// Stop retrying.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            base_delay: Duration::from_millis(config.base_backoff_ms),
        }
    }

    /// Delay before retry number `retry` (1-based): 1s, 2s, 4s, ...
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

/// Non-blocking wait used between attempts. Swappable so tests can run
/// against a fake clock.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Done(T),
    /// Every attempt failed; carries the last error.
    Exhausted(Error),
    /// The classifier refused to retry this error.
    Aborted(Error),
    /// The cancel token fired during a backoff wait.
    Cancelled,
}

pub struct Retry<'a> {
    policy: &'a RetryPolicy,
    sleeper: &'a dyn Sleeper,
    stage: &'a str,
    cancel: Option<&'a CancelToken>,
}

impl<'a> Retry<'a> {
    pub fn new(policy: &'a RetryPolicy, sleeper: &'a dyn Sleeper, stage: &'a str) -> Self {
        Self {
            policy,
            sleeper,
            stage,
            cancel: None,
        }
    }

    /// Check `cancel` after every backoff sleep.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn run<T, F, Fut>(
        &self,
        classify: impl Fn(&Error) -> Disposition,
        mut op: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match op(attempt).await {
                Ok(value) => return RetryOutcome::Done(value),
                Err(e) => e,
            };

            let disposition = classify(&err);
            if disposition == Disposition::Abort {
                tracing::warn!(stage = self.stage, attempt, error = %err, "summarizer call aborted");
                return RetryOutcome::Aborted(err);
            }
            if attempt >= max_attempts {
                tracing::warn!(
                    stage = self.stage,
                    attempts = attempt,
                    error = %err,
                    "summarizer retries exhausted"
                );
                return RetryOutcome::Exhausted(err);
            }

            let delay = match disposition {
                Disposition::Backoff => self.policy.delay_for_retry(attempt),
                _ => Duration::ZERO,
            };
            TraceEvent::SummarizerRetry {
                stage: self.stage.to_owned(),
                attempt,
                max_attempts,
                reason: err.to_string(),
                backoff_ms: delay.as_millis() as u64,
            }
            .emit();

            if !delay.is_zero() {
                self.sleeper.sleep(delay).await;
                if self.cancel.is_some_and(CancelToken::is_cancelled) {
                    tracing::info!(stage = self.stage, attempt, "cancelled during backoff");
                    return RetryOutcome::Cancelled;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait::async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().push(duration);
        }
    }

    fn rate_limited() -> Error {
        Error::RateLimited {
            provider: "test".into(),
            message: "429".into(),
        }
    }

    fn classify(e: &Error) -> Disposition {
        if e.is_rate_limited() {
            Disposition::Backoff
        } else {
            Disposition::Immediate
        }
    }

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn rate_limits_back_off_until_exhausted() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let outcome: RetryOutcome<()> = Retry::new(&policy, &sleeper, "test")
            .run(classify, |_| {
                calls += 1;
                async { Err(rate_limited()) }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Exhausted(e) if e.is_rate_limited()));
        assert_eq!(calls, 3);
        assert_eq!(
            *sleeper.slept.lock(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn other_failures_retry_without_sleeping() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let outcome = Retry::new(&policy, &sleeper, "test")
            .run(classify, |attempt| async move {
                if attempt < 3 {
                    Err(Error::MalformedOutput("nope".into()))
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Done(3)));
        assert!(sleeper.slept.lock().is_empty());
    }

    #[tokio::test]
    async fn abort_stops_immediately() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let outcome: RetryOutcome<()> = Retry::new(&policy, &sleeper, "test")
            .run(
                |_| Disposition::Abort,
                |_| {
                    calls += 1;
                    async { Err(Error::Other("boom".into())) }
                },
            )
            .await;
        assert!(matches!(outcome, RetryOutcome::Aborted(_)));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn cancel_is_checked_after_backoff() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let cancel = CancelToken::new();
        let mut calls = 0;
        let outcome: RetryOutcome<()> = Retry::new(&policy, &sleeper, "test")
            .with_cancel(&cancel)
            .run(classify, |_| {
                calls += 1;
                cancel.cancel();
                async { Err(rate_limited()) }
            })
            .await;
        assert!(matches!(outcome, RetryOutcome::Cancelled));
        assert_eq!(calls, 1);
        assert_eq!(sleeper.slept.lock().len(), 1);
    }
}
