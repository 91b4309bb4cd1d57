//! Resilience pipeline wrapped around every upstream employee call.
//!
//! A wrapped call goes through three stages:
//!
//! 1. admission from the shared [`RateLimiter`] (once per attempt);
//! 2. the upstream call itself;
//! 3. retry with backoff when the [`RetryPolicy`] accepts the failure.
//!
//! Two profiles sit on top. The read profile substitutes a caller-supplied
//! fallback once the call cannot succeed, except for not-found outcomes. The
//! write profile never substitutes and hands the final error back, since a
//! masked mutation leaves the client unable to tell whether it happened.
//!
//! Every suspension point races the caller's [`CancellationToken`]; a
//! cancelled pipeline stops without further attempts.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::ports::{EmployeeGatewayError, Outcome, OutcomeKind};

mod rate_limiter;
mod retry;
mod runtime;

pub use rate_limiter::{Admission, AdmissionRejected, RateLimiter, RateLimiterConfig};
pub use retry::{
    Backoff, BackoffJitter, RetryPolicy, RetryPredicate, RetrySleeper, retry_transient_only,
};
pub use runtime::{AttemptJitter, ResilienceRuntime, TokioSleeper};

/// Terminal failure of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Final upstream outcome once retries were exhausted or refused.
    #[error(transparent)]
    Upstream(#[from] EmployeeGatewayError),
    /// The caller cancelled while the pipeline was waiting or calling.
    #[error("operation cancelled before completion")]
    Cancelled,
}

/// Where a read result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Returned by the upstream service.
    Upstream,
    /// Substituted after the upstream call could not succeed.
    Fallback,
}

/// Value produced by the read profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult<T> {
    /// The usable value.
    pub value: T,
    /// Whether `value` is real or degraded.
    pub source: ReadSource,
}

impl<T> ReadResult<T> {
    fn upstream(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Upstream,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Fallback,
        }
    }

    /// Whether the value is a substituted fallback.
    pub fn is_fallback(&self) -> bool {
        self.source == ReadSource::Fallback
    }

    /// Discard the provenance and keep the value.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Rate limit, retry, and fallback around upstream calls.
pub struct ResiliencePipeline {
    rate_limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    runtime: ResilienceRuntime,
}

impl ResiliencePipeline {
    /// Build a pipeline using default runtime dependencies.
    pub fn new(rate_limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self::with_runtime(rate_limiter, retry, ResilienceRuntime::default())
    }

    /// Build a pipeline with injected runtime abstractions.
    pub fn with_runtime(
        rate_limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        runtime: ResilienceRuntime,
    ) -> Self {
        Self {
            rate_limiter,
            retry,
            runtime,
        }
    }

    /// Run `call` under the read profile.
    ///
    /// Any failure other than not-found is absorbed into `fallback()`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Upstream`] carrying a not-found outcome, or
    /// [`PipelineError::Cancelled`] when `cancel` fires first.
    pub async fn execute_read<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        fallback: impl FnOnce() -> T,
        call: F,
    ) -> Result<ReadResult<T>, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        match self.run(operation, cancel, call).await {
            Ok(value) => Ok(ReadResult::upstream(value)),
            Err(PipelineError::Upstream(error)) if error.kind() != OutcomeKind::NotFound => {
                warn!(operation, error = %error, "substituting fallback for failed read");
                Ok(ReadResult::fallback(fallback()))
            }
            Err(error) => Err(error),
        }
    }

    /// Run `call` under the write profile.
    ///
    /// # Errors
    ///
    /// Returns the final upstream outcome once retries are exhausted or the
    /// failure is not retryable, or [`PipelineError::Cancelled`].
    pub async fn execute_write<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        self.run(operation, cancel, call).await
    }

    async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let mut attempt = 0_u32;
        loop {
            attempt = attempt.saturating_add(1);
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(PipelineError::Cancelled),
                outcome = self.admitted_call(operation, &mut call) => outcome,
            };

            let error = match outcome {
                Ok(value) => {
                    debug!(operation, attempt, "upstream call succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !self.retry.should_retry(&error, attempt) {
                debug!(operation, attempt, error = %error, "upstream call failed; not retrying");
                return Err(PipelineError::Upstream(error));
            }

            let delay = self.runtime.jitter.jittered_delay(
                self.retry.delay_for(attempt),
                attempt,
                self.runtime.clock.utc(),
            );
            warn!(
                operation,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "retrying upstream call"
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(PipelineError::Cancelled),
                () = self.runtime.sleeper.sleep(delay) => {}
            }
        }
    }

    async fn admitted_call<T, F, Fut>(&self, operation: &'static str, call: &mut F) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        if let Err(rejected) = self.rate_limiter.acquire().await {
            warn!(
                operation,
                wait_ms = u64::try_from(rejected.wait.as_millis()).unwrap_or(u64::MAX),
                "rate limiter rejected upstream call"
            );
            return Err(EmployeeGatewayError::rate_limited(rejected.to_string()));
        }
        call().await
    }
}

#[cfg(test)]
mod tests;
