//! Retry policy and the runtime seams used while backing off.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{EmployeeGatewayError, OutcomeKind};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failed attempt.
    Fixed(Duration),
    /// Delay doubling after each failed attempt, capped at `max`.
    Exponential {
        /// Delay after the first failed attempt.
        initial: Duration,
        /// Upper bound on any single delay.
        max: Duration,
    },
}

impl Backoff {
    /// Base delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
                let base_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
                let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
            }
        }
    }
}

/// Decides whether a failed outcome is worth another attempt.
pub type RetryPredicate = fn(&EmployeeGatewayError) -> bool;

/// Default predicate: only transient failures are retried.
///
/// Not-found and rate-limited outcomes are final; retrying them would either
/// repeat a definitive answer or add load to a service asking for less.
pub fn retry_transient_only(error: &EmployeeGatewayError) -> bool {
    error.kind() == OutcomeKind::Transient
}

/// Bounded retry policy.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retry_if: RetryPredicate,
}

impl RetryPolicy {
    /// Build a policy retrying transient failures.
    ///
    /// `max_attempts` counts the first call and is at least one.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    ///
    /// use employee_gateway::domain::resilience::{Backoff, RetryPolicy};
    ///
    /// let policy = RetryPolicy::new(3, Backoff::Fixed(Duration::from_millis(50)));
    /// assert_eq!(policy.max_attempts(), 3);
    /// assert_eq!(policy.delay_for(2), Duration::from_millis(50));
    /// ```
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            retry_if: retry_transient_only,
        }
    }

    /// Replace the retry predicate.
    pub fn with_predicate(self, retry_if: RetryPredicate) -> Self {
        Self { retry_if, ..self }
    }

    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Configured backoff schedule.
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Whether failed attempt number `attempt` should be followed by another.
    pub fn should_retry(&self, error: &EmployeeGatewayError, attempt: u32) -> bool {
        attempt < self.max_attempts && (self.retry_if)(error)
    }

    /// Base delay after failed attempt number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay_for(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            Backoff::Exponential {
                initial: Duration::from_millis(500),
                max: Duration::from_secs(5),
            },
        )
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

/// Async sleeping abstraction used between retry attempts.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust
    /// use async_trait::async_trait;
    /// use employee_gateway::domain::resilience::RetrySleeper;
    /// use std::sync::Mutex;
    /// use std::time::Duration;
    ///
    /// #[derive(Default)]
    /// struct CountingSleeper {
    ///     calls: Mutex<u32>,
    /// }
    ///
    /// #[async_trait]
    /// impl RetrySleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.calls.lock().expect("calls mutex") += 1;
    ///     }
    /// }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return the delay to actually wait given the scheduled `base` delay.
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}
