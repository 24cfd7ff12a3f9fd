//! Optimistic-concurrency retry.
//!
//! A create or delete that loses a write race against another writer gets a
//! 409 Conflict. Those are retried a bounded number of times with exponential
//! backoff; every other outcome is handed straight back to the caller.

use crate::config::RetryConfig;
use crate::error::RegistryError;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff between conflict retries.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for Backoff {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts,
        }
    }
}

impl Backoff {
    /// Delay before attempt `attempt` (0-indexed). The first attempt is immediate.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_us =
            self.initial_delay.as_micros() as f64 * self.multiplier.powi((attempt - 1) as i32);
        let capped_us = base_us.min(self.max_delay.as_micros() as f64);
        Duration::from_micros(capped_us as u64)
    }
}

/// Runs `op` until it returns anything other than a conflict, or the
/// attempt budget is spent. The last result is returned as-is.
pub async fn retry_on_conflict<F, Fut>(backoff: &Backoff, mut op: F) -> Result<(), RegistryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), RegistryError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_conflict() && attempt + 1 < backoff.max_attempts => {
                attempt += 1;
                let delay = backoff.delay_for_attempt(attempt);
                tracing::debug!(attempt, ?delay, "Write conflict, retrying");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> Backoff {
        Backoff {
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(4),
            max_attempts: 5,
        }
    }

    fn conflict() -> RegistryError {
        RegistryError::Conflict("a.csi.io".to_string())
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let backoff = fast();

        assert_eq!(backoff.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(1));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(2));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(4));
        assert_eq!(backoff.delay_for_attempt(4), Duration::from_millis(4));
    }

    #[test]
    fn test_default_matches_retry_config() {
        let backoff = Backoff::default();
        assert_eq!(backoff.initial_delay, Duration::from_millis(10));
        assert_eq!(backoff.max_attempts, 5);
    }

    #[tokio::test]
    async fn test_succeeds_after_two_conflicts() {
        let calls = AtomicU32::new(0);

        let result = retry_on_conflict(&fast(), || async {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(conflict()),
                _ => Ok(()),
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result = retry_on_conflict(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(result.unwrap_err().is_conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_other_errors_not_retried() {
        let calls = AtomicU32::new(0);

        let result = retry_on_conflict(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RegistryError::Api {
                code: 403,
                reason: "Forbidden".to_string(),
                message: "denied".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(RegistryError::Api { code: 403, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_budget() {
        let calls = AtomicU32::new(0);
        let backoff = Backoff { max_attempts: 1, ..fast() };

        let result = retry_on_conflict(&backoff, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
