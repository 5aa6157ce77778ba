//! Bounded retry with exponential backoff for fetch operations.
//!
//! The transport client never retries on its own; the query layer wraps every
//! fetch in this policy so transient failures are absorbed before an entry is
//! marked failed.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one
  pub max_attempts: u32,
  /// Backoff before the first retry; doubles per attempt
  pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_backoff_ms: 200,
    }
  }
}

impl From<&RetryConfig> for RetryPolicy {
  fn from(config: &RetryConfig) -> Self {
    Self {
      max_attempts: config.max_attempts.max(1),
      base_backoff_ms: config.base_backoff_ms,
    }
  }
}

impl RetryPolicy {
  /// Backoff before the given retry (1-based attempt that just failed).
  pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    Duration::from_millis(self.base_backoff_ms.saturating_mul(1 << exponent))
  }

  fn should_retry(&self, error: &Error, attempt: u32) -> bool {
    attempt < self.max_attempts && is_transient(error)
  }
}

/// Transport failures and 5xx responses are worth another attempt; client
/// errors are not.
pub fn is_transient(error: &Error) -> bool {
  match error {
    Error::Network(_) => true,
    Error::Server { status, .. } => *status >= 500,
    _ => false,
  }
}

/// Run `op` under the policy, returning the last error once attempts run out.
pub async fn run_with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let mut attempt = 1u32;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(err) if policy.should_retry(&err, attempt) => {
        tracing::debug!(attempt, error = %err, "fetch failed, retrying");
        tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
        attempt += 1;
      }
      Err(err) => return Err(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
      max_attempts,
      base_backoff_ms: 1,
    }
  }

  #[tokio::test]
  async fn recovers_within_the_attempt_limit() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let result = run_with_retry(fast_policy(3), move || {
      let calls = calls_clone.clone();
      async move {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
          Err(Error::Network("connection reset".to_string()))
        } else {
          Ok(7)
        }
      }
    })
    .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn gives_up_after_max_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let result: Result<()> = run_with_retry(fast_policy(3), move || {
      let calls = calls_clone.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Server {
          status: 503,
          detail: "unavailable".to_string(),
        })
      }
    })
    .await;

    assert!(matches!(result, Err(Error::Server { status: 503, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn client_errors_are_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let result: Result<()> = run_with_retry(fast_policy(3), move || {
      let calls = calls_clone.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Server {
          status: 404,
          detail: "not found".to_string(),
        })
      }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn backoff_doubles_per_attempt() {
    let policy = RetryPolicy {
      max_attempts: 4,
      base_backoff_ms: 100,
    };
    assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
    assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
  }
}
