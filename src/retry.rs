//! Retry with exponential backoff for backing-store writes.
//!
//! Fatal failures (missing client dependency, deleted canvas) short-circuit
//! the remaining attempts; everything else is assumed transient and retried
//! up to the policy's attempt budget.

use std::{future::Future, time::Duration};

use rand::Rng;
use tokio::time;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
   /// Delay before the first retry.
   pub initial_delay: Duration,
   /// Cap applied to the backoff ladder.
   pub max_delay: Duration,
   /// Multiplier applied to the delay after each retry.
   pub backoff_factor: f64,
   /// Random jitter range as a fraction of the delay (0.1 = ±10%).
   pub jitter_percent: f64,
   /// Total attempts, first try included.
   pub max_attempts: u32,
}

impl RetryPolicy {
   /// Policy for vector-index invocations: 3 attempts, 1s initial, 4s cap.
   #[must_use]
   pub const fn index() -> Self {
      Self {
         initial_delay:  Duration::from_secs(1),
         max_delay:      Duration::from_secs(4),
         backoff_factor: 2.0,
         jitter_percent: 0.0,
         max_attempts:   3,
      }
   }

   /// Policy for per-edge graph writes: 3 attempts, 100ms initial.
   #[must_use]
   pub const fn edge_write() -> Self {
      Self {
         initial_delay:  Duration::from_millis(100),
         max_delay:      Duration::from_secs(1),
         backoff_factor: 2.0,
         jitter_percent: 0.1,
         max_attempts:   3,
      }
   }

   #[must_use]
   pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
      self.max_attempts = max_attempts.max(1);
      self
   }

   /// Calculates the delay for a given retry number (0-indexed).
   #[must_use]
   #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
   pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
      let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
      let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);

      // Cap the exponent so powi cannot overflow.
      let exp = attempt.min(31) as i32;
      let base_ms = (initial_ms as f64) * self.backoff_factor.max(1.0).powi(exp);
      let base_ms = base_ms.min(max_ms as f64);

      let jitter = if self.jitter_percent > 0.0 {
         let mut rng = rand::rng();
         let jitter_range = base_ms * self.jitter_percent;
         rng.random_range(-jitter_range..=jitter_range)
      } else {
         0.0
      };

      let delay_ms = (base_ms + jitter).max(0.0);
      Duration::from_millis(delay_ms as u64)
   }
}

/// Whether an error may succeed on a later attempt.
#[must_use]
pub fn is_retryable(error: &Error) -> bool {
   match error {
      // I/O errors are generally transient (slow disk, contention).
      Error::Io(_) => true,
      // A document that fails to parse will keep failing to parse.
      Error::Json(_) => false,
      Error::Config(_) => false,
      Error::Sync(e) => !e.is_fatal(),
   }
}

/// Executes an async operation with retry and exponential backoff.
///
/// Fatal errors (per [`is_retryable`]) are returned immediately. On
/// exhaustion the last error is surfaced to the caller, which owns any
/// persistence of the failure.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
   F: FnMut() -> Fut,
   Fut: Future<Output = Result<T>>,
{
   let start = std::time::Instant::now();
   let mut attempt = 0u32;

   loop {
      match operation().await {
         Ok(value) => {
            if attempt > 0 {
               debug!(
                  total_attempts = attempt + 1,
                  retries = attempt,
                  "operation succeeded after retries"
               );
            }
            return Ok(value);
         },
         Err(e) => {
            attempt += 1;

            if !is_retryable(&e) {
               debug!(attempt, error = %e, "non-retryable error, giving up");
               return Err(e);
            }

            if attempt >= policy.max_attempts {
               warn!(
                  attempt,
                  max_attempts = policy.max_attempts,
                  error = %e,
                  elapsed_ms = start.elapsed().as_millis() as u64,
                  "operation failed after all retry attempts"
               );
               return Err(e);
            }

            let delay = policy.delay_for_attempt(attempt - 1);
            debug!(
               attempt,
               delay_ms = delay.as_millis() as u64,
               error = %e,
               "retrying operation after transient failure"
            );

            time::sleep(delay).await;
         },
      }
   }
}

#[cfg(test)]
mod tests {
   use std::sync::{
      Arc,
      atomic::{AtomicU32, Ordering},
   };

   use super::*;
   use crate::error::SyncError;

   #[test]
   fn index_policy_backoff_ladder_is_capped() {
      let policy = RetryPolicy::index();
      assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
      assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
      assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
      assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
      assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(4));
   }

   #[tokio::test(start_paused = true)]
   async fn transient_errors_exhaust_attempt_budget() {
      let calls = Arc::new(AtomicU32::new(0));
      let calls_clone = calls.clone();

      let result: Result<()> = with_retry(&RetryPolicy::index(), move || {
         let calls = calls_clone.clone();
         async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SyncError::TransientWrite {
               op:     "index_canvas",
               reason: "store busy".to_string(),
            }
            .into())
         }
      })
      .await;

      assert!(result.is_err());
      assert_eq!(calls.load(Ordering::SeqCst), 3);
   }

   #[tokio::test(start_paused = true)]
   async fn fatal_errors_short_circuit_retries() {
      let calls = Arc::new(AtomicU32::new(0));
      let calls_clone = calls.clone();

      let result: Result<()> = with_retry(&RetryPolicy::index(), move || {
         let calls = calls_clone.clone();
         async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SyncError::ClientUnavailable {
               client: "vector-index",
               reason: "dependency missing".to_string(),
            }
            .into())
         }
      })
      .await;

      assert!(result.is_err());
      assert_eq!(calls.load(Ordering::SeqCst), 1);
   }

   #[tokio::test(start_paused = true)]
   async fn eventual_success_returns_value() {
      let calls = Arc::new(AtomicU32::new(0));
      let calls_clone = calls.clone();

      let result = with_retry(&RetryPolicy::index(), move || {
         let calls = calls_clone.clone();
         async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
               Err(SyncError::Timeout { op: "index_canvas", elapsed_ms: 30_000 }.into())
            } else {
               Ok(42usize)
            }
         }
      })
      .await;

      assert_eq!(result.unwrap(), 42);
      assert_eq!(calls.load(Ordering::SeqCst), 3);
   }
}
