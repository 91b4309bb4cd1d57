//! Shared permit-window rate limiter guarding upstream calls.
//!
//! The limiter hands out `limit_for_period` permits per `refresh_period`.
//! When the current window is exhausted a caller reserves a permit in the
//! next window with spare capacity and waits for it to open, provided the wait
//! fits within `timeout`. Callers whose wait would exceed the timeout are
//! rejected immediately and reserve nothing.
//!
//! One instance is shared (via `Arc`) by every call site that talks to the
//! same upstream dependency, so all in-flight calls draw on one budget.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

const MIN_REFRESH_PERIOD: Duration = Duration::from_millis(1);

/// Rate limiter tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Permits granted per refresh window.
    pub limit_for_period: u32,
    /// Length of one refresh window.
    pub refresh_period: Duration,
    /// Longest a caller may wait for a permit before being rejected.
    pub timeout: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit_for_period: 10,
            refresh_period: Duration::from_secs(1),
            timeout: Duration::from_secs(2),
        }
    }
}

/// Successful admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A permit from the current window was taken.
    Immediate,
    /// A permit in a later window was reserved; the caller must wait `wait`.
    Reserved {
        /// Time until the reserved permit becomes usable.
        wait: Duration,
    },
}

/// No permit could be obtained within the configured timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no permit available within {timeout:?}; next permit in {wait:?}")]
pub struct AdmissionRejected {
    /// Wait that would have been required.
    pub wait: Duration,
    /// Configured admission timeout.
    pub timeout: Duration,
}

#[derive(Debug)]
struct PermitWindow {
    started_at: Instant,
    // Negative values count permits reserved in future windows.
    available: i64,
}

impl PermitWindow {
    fn refresh(&mut self, now: Instant, period: Duration, limit: i64) {
        let elapsed = now.saturating_duration_since(self.started_at);
        let cycles = elapsed.as_nanos() / period.as_nanos();
        if cycles == 0 {
            return;
        }

        let granted = limit.saturating_mul(i64::try_from(cycles).unwrap_or(i64::MAX));
        self.available = self.available.saturating_add(granted).min(limit);

        let into_window = u64::try_from(elapsed.as_nanos() % period.as_nanos()).unwrap_or(0);
        self.started_at = now
            .checked_sub(Duration::from_nanos(into_window))
            .unwrap_or(now);
    }
}

/// Atomic permit admission shared by all upstream calls.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    window: Mutex<PermitWindow>,
}

impl RateLimiter {
    /// Build a limiter whose first window opens now with a full budget.
    ///
    /// A zero `limit_for_period` is raised to one permit and the refresh
    /// period is at least one millisecond.
    pub fn new(config: RateLimiterConfig) -> Self {
        let config = RateLimiterConfig {
            limit_for_period: config.limit_for_period.max(1),
            refresh_period: config.refresh_period.max(MIN_REFRESH_PERIOD),
            timeout: config.timeout,
        };
        Self {
            window: Mutex::new(PermitWindow {
                started_at: Instant::now(),
                available: i64::from(config.limit_for_period),
            }),
            config,
        }
    }

    /// Effective configuration after normalisation.
    pub fn config(&self) -> RateLimiterConfig {
        self.config
    }

    /// Take or reserve one permit without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionRejected`] when the next free permit opens later
    /// than the configured timeout.
    pub fn reserve(&self) -> Result<Admission, AdmissionRejected> {
        self.reserve_at(Instant::now())
    }

    /// Obtain one permit, waiting for a reserved window when necessary.
    ///
    /// Dropping the returned future while it waits does not return the
    /// reserved permit; the reservation simply lapses with its window.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionRejected`] when no permit is available within the
    /// configured timeout.
    pub async fn acquire(&self) -> Result<(), AdmissionRejected> {
        match self.reserve()? {
            Admission::Immediate => Ok(()),
            Admission::Reserved { wait } => {
                debug!(wait_ms = wait.as_millis(), "waiting for reserved rate-limit permit");
                tokio::time::sleep(wait).await;
                Ok(())
            }
        }
    }

    /// Permits left in the current window (zero when permits are reserved ahead).
    pub fn available_permits(&self) -> u32 {
        let limit = i64::from(self.config.limit_for_period);
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.refresh(Instant::now(), self.config.refresh_period, limit);
        u32::try_from(window.available.max(0)).unwrap_or(u32::MAX)
    }

    fn reserve_at(&self, now: Instant) -> Result<Admission, AdmissionRejected> {
        let limit = i64::from(self.config.limit_for_period);
        let period = self.config.refresh_period;
        // Window state is only updated after all checks pass, so a poisoned
        // lock still guards a consistent window.
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.refresh(now, period, limit);

        if window.available > 0 {
            window.available -= 1;
            return Ok(Admission::Immediate);
        }

        let reserved_ahead = window.available.unsigned_abs();
        let windows_ahead = reserved_ahead / limit.unsigned_abs() + 1;
        let offset = period.saturating_mul(u32::try_from(windows_ahead).unwrap_or(u32::MAX));
        let wait = window
            .started_at
            .checked_add(offset)
            .map_or(Duration::MAX, |opens_at| opens_at.saturating_duration_since(now));

        if wait > self.config.timeout {
            return Err(AdmissionRejected {
                wait,
                timeout: self.config.timeout,
            });
        }

        window.available -= 1;
        Ok(Admission::Reserved { wait })
    }
}
