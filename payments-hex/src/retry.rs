//! Fixed-delay retry for bank confirmation calls.
//!
//! Only transport failures ([`BankError::is_retryable`]) are retried. A
//! business rejection is an `Ok` outcome and never reaches this loop, and
//! protocol errors are returned on the first occurrence.

use std::future::Future;
use std::time::Duration;

use payments_types::BankError;

/// How often, and how patiently, a bank call is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (default: 3)
    pub max_attempts: u32,
    /// Pause between attempts (default: 2s)
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` is used up. Returns the last error in the latter case.
///
/// A policy with `max_attempts == 0` still makes one attempt.
pub async fn retry_bank_call<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, BankError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BankError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Bank call succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    bank = %error.bank(),
                    error = %error,
                    "Bank call failed"
                );

                // Don't sleep after the last attempt
                if attempt >= max_attempts {
                    return Err(error);
                }

                tracing::debug!(
                    delay_ms = policy.delay.as_millis() as u64,
                    "Sleeping before retry"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payments_types::Bank;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    fn unavailable() -> BankError {
        BankError::Unavailable {
            bank: Bank::Loaners,
            message: "connection refused".into(),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_bank_call(&fast_policy(3), || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok("approved")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "approved");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error_when_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry_bank_call(&fast_policy(3), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            }
        })
        .await;

        assert!(matches!(result, Err(BankError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_protocol_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry_bank_call(&fast_policy(3), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BankError::Protocol {
                    bank: Bank::BigBank,
                    message: "missing field `successful`".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(BankError::Protocol { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let _: Result<(), _> = retry_bank_call(&fast_policy(0), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_last_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let _: Result<(), _> = retry_bank_call(&policy, || async { Err(unavailable()) }).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(4));
    }
}
