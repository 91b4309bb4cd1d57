//! Shared test doubles for resilience pipeline tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::resilience::{
    Backoff, BackoffJitter, RateLimiter, RateLimiterConfig, ResiliencePipeline, ResilienceRuntime,
    RetryPolicy, RetrySleeper,
};

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}",)
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl RetrySleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut entries = match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        };
        entries.push(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

/// Limiter generous enough never to interfere with a test.
pub fn unlimited_rate_limiter() -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(RateLimiterConfig {
        limit_for_period: u32::MAX,
        refresh_period: Duration::from_secs(1),
        timeout: Duration::ZERO,
    }))
}

/// Runtime that records backoff delays instead of sleeping.
pub fn recording_runtime(sleeper: Arc<RecordingSleeper>) -> ResilienceRuntime {
    ResilienceRuntime {
        sleeper,
        jitter: Arc::new(NoJitter),
        clock: Arc::new(DefaultClock),
    }
}

/// Pipeline with no admission pressure, no jitter, and instant backoff.
pub fn instant_pipeline(max_attempts: u32) -> ResiliencePipeline {
    ResiliencePipeline::with_runtime(
        unlimited_rate_limiter(),
        RetryPolicy::new(max_attempts, Backoff::Fixed(Duration::from_millis(10))),
        ResilienceRuntime {
            sleeper: Arc::new(ImmediateSleeper),
            jitter: Arc::new(NoJitter),
            clock: Arc::new(DefaultClock),
        },
    )
}
