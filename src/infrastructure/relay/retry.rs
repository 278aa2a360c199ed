//! Exponential backoff around single transport attempts

use std::future::Future;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::domain::{DomainError, RetryPolicy, TransportError};
use crate::infrastructure::observability::record_relay_attempt;

/// Run `attempt` until it succeeds, fails terminally or the policy runs out.
///
/// The closure receives the 1-based attempt number. A terminal failure is
/// returned at once as `InvalidRequest`. Running out of attempts, or passing
/// the policy's `max_elapsed` deadline, gives `RelayExhausted` with the last
/// failure; an attempt still in flight at the deadline is dropped.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> Result<T, DomainError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let deadline = policy.max_elapsed.map(|max| Instant::now() + max);
    let max_attempts = policy.max_attempts.max(1);
    let mut number = 1;

    loop {
        let outcome = match deadline {
            Some(deadline) => match timeout_at(deadline, attempt(number)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    record_relay_attempt(operation, number, false);
                    return Err(deadline_exceeded(policy, number));
                }
            },
            None => attempt(number).await,
        };

        let error = match outcome {
            Ok(value) => {
                record_relay_attempt(operation, number, true);
                if number > 1 {
                    debug!(operation, attempt = number, "Relay call succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        record_relay_attempt(operation, number, false);

        if !error.is_retryable() {
            warn!(operation, attempt = number, error = %error, "Relay call failed terminally");
            return Err(DomainError::invalid_request(error.detail()));
        }

        if number >= max_attempts {
            warn!(operation, attempts = number, error = %error, "Relay attempts exhausted");
            return Err(DomainError::relay_exhausted(number, error));
        }

        let delay = policy.delay_for_attempt(number);
        if let Some(deadline) = deadline {
            if Instant::now() + delay >= deadline {
                warn!(operation, attempts = number, error = %error, "Relay deadline reached before next attempt");
                return Err(DomainError::relay_exhausted(number, error));
            }
        }

        warn!(
            operation,
            attempt = number,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Relay call failed, retrying"
        );
        tokio::time::sleep(delay).await;
        number += 1;
    }
}

fn deadline_exceeded(policy: &RetryPolicy, attempts: u32) -> DomainError {
    let limit = policy.max_elapsed.unwrap_or_default();
    warn!(attempts, limit_ms = limit.as_millis() as u64, "Relay deadline exceeded");
    DomainError::relay_exhausted(
        attempts,
        TransportError::timeout(format!("deadline of {}ms exceeded", limit.as_millis())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_retryable_failures() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = retry_with_backoff(&policy(3), "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(TransportError::status(503, "busy"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms then 200ms of backoff
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_carries_last_error() {
        let result: Result<(), _> = retry_with_backoff(&policy(2), "test", |attempt| async move {
            Err(TransportError::connect(format!("refused #{}", attempt)))
        })
        .await;

        match result {
            Err(DomainError::RelayExhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last, TransportError::connect("refused #2"));
            }
            other => panic!("expected RelayExhausted, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_with_backoff(&policy(5), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::status(400, "Message too long")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result {
            Err(DomainError::InvalidRequest { message }) => assert_eq!(message, "Message too long"),
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried() {
        let result = retry_with_backoff(&policy(2), "test", |attempt| async move {
            if attempt == 1 {
                Err(TransportError::status(429, "slow down"))
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_abandons_slow_attempt() {
        let policy = policy(5).with_max_elapsed(Duration::from_millis(250));
        let started = Instant::now();

        let result: Result<(), _> = retry_with_backoff(&policy, "test", |_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(DomainError::RelayExhausted {
                attempts: 1,
                last: TransportError::Timeout(_)
            })
        ));
        assert_eq!(started.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_before_pointless_wait() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(200))
            .with_max_elapsed(Duration::from_millis(300));

        let result: Result<(), _> = retry_with_backoff(&policy, "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::timeout("slow")) }
        })
        .await;

        // 200ms wait fits, the following 400ms wait does not
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            result,
            Err(DomainError::RelayExhausted { attempts: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let result: Result<(), _> = retry_with_backoff(&RetryPolicy::no_retry(), "test", |_| async {
            Err(TransportError::malformed("eof"))
        })
        .await;

        assert!(matches!(
            result,
            Err(DomainError::RelayExhausted { attempts: 1, .. })
        ));
    }
}
