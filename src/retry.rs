//! Retry of transient HTTP failures inside a single source
//!
//! Falling through to the next source is the main recovery mechanism. Retries
//! (one extra attempt by default) only cover failures that say nothing about
//! whether the image exists: timeouts, refused connections, 429 and 5xx.

use crate::config::RetryConfig;
use crate::error::StrategyError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for StrategyError {
    fn is_retryable(&self) -> bool {
        match self {
            StrategyError::Network {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            // No status: the request never got an answer (timeout, connect, reset)
            StrategyError::Network { status: None, .. } => true,
            // The server answered and the answer was not useful; asking again won't help
            StrategyError::Parse { .. } | StrategyError::NotFound(_) => false,
            StrategyError::Io { .. } => false,
        }
    }
}

/// Run an async operation, retrying transient failures with exponential backoff
///
/// Returns the first success, or the last error once the operation fails with a
/// non-retryable error or `config.max_attempts` retries have been spent.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::debug!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "request failed, retrying"
                );

                let wait = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(wait).await;

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Stretch a delay by a random factor in `[1.0, 2.0]`
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    fn network(status: Option<u16>) -> StrategyError {
        StrategyError::Network {
            url: "http://vendor.test/a.jpg".into(),
            reason: "boom".into(),
            status,
            timeout: status.is_none(),
        }
    }

    #[test]
    fn classifies_strategy_errors() {
        assert!(network(None).is_retryable(), "timeouts are transient");
        assert!(network(Some(503)).is_retryable());
        assert!(network(Some(429)).is_retryable());
        assert!(!network(Some(404)).is_retryable(), "404 means no image");
        assert!(!network(Some(403)).is_retryable());
        assert!(!StrategyError::parse("http://x", "missing img").is_retryable());
        assert!(!StrategyError::NotFound("no suggestion".into()).is_retryable());
        assert!(
            !StrategyError::Io {
                path: PathBuf::from("/nope/a.jpg"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            }
            .is_retryable()
        );
    }

    #[tokio::test]
    async fn transient_failure_is_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&fast_config(2), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(network(Some(502)))
                } else {
                    Ok("bytes")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "bytes");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&fast_config(3), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network(Some(404)))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_budget_is_bounded() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&fast_config(2), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network(None))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3, "initial attempt + 2 retries");
    }

    #[tokio::test]
    async fn zero_budget_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let _ = with_retry(&fast_config(0), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network(Some(500)))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let delay = Duration::from_millis(100);
        for _ in 0..20 {
            let jittered = add_jitter(delay);
            assert!(jittered >= delay);
            assert!(jittered <= delay * 2);
        }
    }
}
