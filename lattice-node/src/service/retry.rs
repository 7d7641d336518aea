//! Retry policy for network-dependent steps
//!
//! A [`RetryPolicy`] wraps one invocation of an operation: it runs it up to
//! `max_attempts` times and waits `delay(i)` after the i-th failure. The wait
//! also follows the final failure, so the seed policy waits 5,5,5 and the
//! report policy 2,4,8,16,32 before giving up. Exhaustion fails only the
//! invocation at hand; the caller decides what that means.

use serde_json::json;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::logging::Logger;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every attempt
    Fixed(Duration),
    /// `first × 2^attempt`, capped at `max`
    Exponential { first: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the failed attempt with the given 0-based index
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { first, max } => 2u32
                .checked_pow(attempt)
                .and_then(|factor| first.checked_mul(factor))
                .map_or(max, |delay| delay.min(max)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// Terminal failure of one retried invocation
#[derive(Debug, Error)]
#[error("{operation} failed after {attempts} attempt(s): {last_error:#}")]
pub struct RetryError {
    pub operation: String,
    pub attempts: u32,
    pub last_error: anyhow::Error,
}

impl RetryPolicy {
    /// Seed fetch: 3 attempts, 5 s apart
    pub const fn seed_fetch() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(5)),
        }
    }

    /// Result report: 5 attempts, 2 s doubling up to 32 s
    pub const fn result_report() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::Exponential {
                first: Duration::from_secs(2),
                max: Duration::from_secs(32),
            },
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Runs `op` until it succeeds or the attempts are used up
    ///
    /// `op` receives the 1-based attempt number. Every failure is logged with
    /// the attempt number and the error before the policy waits.
    pub async fn run<T, F, Fut>(
        &self,
        logger: &Logger,
        operation: &str,
        mut op: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        logger.info(format!(
                            "{} succeeded after {} attempt(s)",
                            operation, attempt
                        ));
                    }
                    return Ok(value);
                }
                Err(e) => {
                    let delay = self.delay(attempt - 1);
                    logger.warn_with(
                        format!(
                            "{} failed (attempt {}/{}): {:#}",
                            operation, attempt, max_attempts, e
                        ),
                        json!({
                            "attempt": attempt,
                            "maxAttempts": max_attempts,
                            "delayMs": delay.as_millis() as u64,
                            "error": format!("{:#}", e),
                        }),
                    );

                    tokio::time::sleep(delay).await;

                    if attempt >= max_attempts {
                        logger.error_with(
                            format!("{} gave up after {} attempt(s)", operation, attempt),
                            json!({ "attempt": attempt, "error": format!("{:#}", e) }),
                        );
                        return Err(RetryError {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogBus;
    use lattice_core::domain::log::LogLevel;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_seed_fetch_schedule() {
        let policy = RetryPolicy::seed_fetch();
        assert_eq!(policy.max_attempts, 3);
        for attempt in 0..3 {
            assert_eq!(policy.delay(attempt), Duration::from_secs(5));
        }
    }

    #[test]
    fn test_result_report_schedule() {
        let policy = RetryPolicy::result_report();
        assert_eq!(policy.max_attempts, 5);
        let delays: Vec<u64> = (0..5).map(|a| policy.delay(a).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32]);
        assert_eq!(policy.delay(6), Duration::from_secs(32));
    }

    #[test]
    fn test_exponential_never_overflows() {
        let backoff = Backoff::Exponential {
            first: Duration::from_secs(2),
            max: Duration::from_secs(32),
        };
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(32));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_wait() {
        let bus = LogBus::new(16);
        let started = Instant::now();

        let value = RetryPolicy::result_report()
            .run(&bus.logger("retry"), "report", |_| async { Ok(7) })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_failures() {
        let bus = LogBus::new(16);
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let value = RetryPolicy::seed_fetch()
            .run(&bus.logger("retry"), "seed fetch", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        anyhow::bail!("not yet");
                    }
                    Ok(attempt)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_attempts_and_waits() {
        let bus = LogBus::new(64);
        let mut rx = bus.subscribe();
        let started = Instant::now();

        let err = RetryPolicy::result_report()
            .run(&bus.logger("retry"), "result report", |_| async {
                Err::<(), _>(anyhow::anyhow!("connection refused"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 5);
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(started.elapsed(), Duration::from_secs(2 + 4 + 8 + 16 + 32));

        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        while let Ok(record) = rx.try_recv() {
            match record.level {
                LogLevel::Warn => warnings.push(record),
                LogLevel::Error => errors.push(record),
                _ => {}
            }
        }
        assert_eq!(warnings.len(), 5);
        assert_eq!(warnings[4].data.as_ref().unwrap()["attempt"], 5);
        assert!(warnings[0].message.contains("connection refused"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data.as_ref().unwrap()["attempt"], 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let bus = LogBus::new(16);
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Backoff::Fixed(Duration::from_secs(1)),
        };
        let calls = AtomicU32::new(0);

        let err = policy
            .run(&bus.logger("retry"), "op", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(anyhow::anyhow!("nope")) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
