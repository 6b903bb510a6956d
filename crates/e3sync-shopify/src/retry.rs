//! Exponential back-off with jitter for Admin API calls.
//!
//! Only [`DestinationError::is_retriable`] errors are retried; validation
//! failures and anything that may have reached the store are returned on
//! the first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::DestinationError;

const MAX_DELAY_MS: u64 = 60_000;

/// Runs `operation` with up to `max_retries` additional attempts.
///
/// The n-th retry waits `backoff_base_ms * 2^(n-1)` ± 25 % jitter, raised to
/// the server's `Retry-After` when rate limited, and capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DestinationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DestinationError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt, &err);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient destination error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32, err: &DestinationError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (computed as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    let floor = match err {
        DestinationError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    jittered.max(floor).min(MAX_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn rate_limited() -> DestinationError {
        DestinationError::RateLimited {
            retry_after_secs: 0,
        }
    }

    #[tokio::test]
    async fn retries_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<&str, DestinationError>("gid://shopify/Product/1")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "gid://shopify/Product/1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), DestinationError>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(DestinationError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn never_retries_validation_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), DestinationError>(DestinationError::Validation {
                    user_errors: Vec::new(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DestinationError::Validation { .. })));
    }

    #[tokio::test]
    async fn never_retries_server_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), DestinationError>(DestinationError::Transport {
                    status: 500,
                    body: String::new(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[test]
    fn delay_respects_retry_after_and_cap() {
        let err = DestinationError::RateLimited {
            retry_after_secs: 2,
        };
        assert_eq!(backoff_delay_ms(0, 1, &err), 2_000);

        let err = DestinationError::RateLimited {
            retry_after_secs: 600,
        };
        assert_eq!(backoff_delay_ms(0, 1, &err), MAX_DELAY_MS);
    }
}
