//! Pipeline behaviour across both profiles.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rstest::rstest;
use tokio::time::Instant;

use super::*;
use crate::test_support::resilience::{
    RecordingSleeper, instant_pipeline, recording_runtime, unlimited_rate_limiter,
};

/// Closure-friendly script of outcomes with an attempt counter.
struct Script {
    outcomes: Mutex<VecDeque<Outcome<u32>>>,
    attempts: AtomicU32,
}

impl Script {
    fn new(outcomes: impl IntoIterator<Item = Outcome<u32>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            attempts: AtomicU32::new(0),
        }
    }

    fn transient_then(failures: usize, value: u32) -> Self {
        Self::new(
            std::iter::repeat_with(|| Err(EmployeeGatewayError::transient("503")))
                .take(failures)
                .chain(std::iter::once(Ok(value))),
        )
    }

    async fn call(&self) -> Outcome<u32> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .expect("script mutex")
            .pop_front()
            .unwrap_or_else(|| Err(EmployeeGatewayError::transient("script exhausted")))
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[tokio::test]
async fn succeeds_after_k_transient_failures_with_k_plus_one_attempts(#[case] failures: usize) {
    let pipeline = instant_pipeline(3);
    let script = Script::transient_then(failures, 7);

    let result = pipeline
        .execute_read("list", &CancellationToken::new(), || 0, || script.call())
        .await
        .expect("read succeeds");

    assert_eq!(result, ReadResult::upstream(7));
    assert_eq!(script.attempts(), u32::try_from(failures).expect("small") + 1);
}

#[rstest]
#[tokio::test]
async fn read_profile_returns_fallback_after_exhaustion() {
    let pipeline = instant_pipeline(3);
    let script = Script::transient_then(5, 7);

    let result = pipeline
        .execute_read("list", &CancellationToken::new(), || 42, || script.call())
        .await
        .expect("read degrades instead of failing");

    assert!(result.is_fallback());
    assert_eq!(result.into_value(), 42);
    assert_eq!(script.attempts(), 3);
}

#[rstest]
#[tokio::test]
async fn write_profile_propagates_final_error_after_exhaustion() {
    let pipeline = instant_pipeline(3);
    let script = Script::transient_then(5, 7);

    let error = pipeline
        .execute_write("create", &CancellationToken::new(), || script.call())
        .await
        .expect_err("write must not be masked");

    assert_eq!(
        error,
        PipelineError::Upstream(EmployeeGatewayError::transient("503"))
    );
    assert_eq!(script.attempts(), 3);
}

#[rstest]
#[tokio::test]
async fn rate_limited_outcome_is_not_retried_and_falls_back_on_read() {
    let pipeline = instant_pipeline(3);
    let script = Script::new([Err(EmployeeGatewayError::rate_limited("429"))]);

    let result = pipeline
        .execute_read("get", &CancellationToken::new(), || 0, || script.call())
        .await
        .expect("read degrades");

    assert!(result.is_fallback());
    assert_eq!(script.attempts(), 1);
}

#[rstest]
#[tokio::test]
async fn not_found_propagates_from_read_profile() {
    let pipeline = instant_pipeline(3);
    let script = Script::new([Err(EmployeeGatewayError::not_found("no such id"))]);

    let error = pipeline
        .execute_read("get", &CancellationToken::new(), || 0, || script.call())
        .await
        .expect_err("not found must surface");

    assert_eq!(
        error,
        PipelineError::Upstream(EmployeeGatewayError::not_found("no such id"))
    );
    assert_eq!(script.attempts(), 1);
}

#[rstest]
#[tokio::test]
async fn backoff_delays_follow_the_exponential_schedule() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let pipeline = ResiliencePipeline::with_runtime(
        unlimited_rate_limiter(),
        RetryPolicy::new(
            4,
            Backoff::Exponential {
                initial: Duration::from_millis(100),
                max: Duration::from_millis(250),
            },
        ),
        recording_runtime(Arc::clone(&sleeper)),
    );
    let script = Script::transient_then(3, 1);

    pipeline
        .execute_write("create", &CancellationToken::new(), || script.call())
        .await
        .expect("fourth attempt succeeds");

    assert_eq!(
        sleeper.recorded(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(250),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn cancelled_token_stops_before_the_first_attempt() {
    let pipeline = instant_pipeline(3);
    let script = Script::transient_then(0, 1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = pipeline
        .execute_read("list", &cancel, || 0, || script.call())
        .await
        .expect_err("cancelled read does not fall back");

    assert_eq!(error, PipelineError::Cancelled);
    assert_eq!(script.attempts(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_abandons_remaining_retries() {
    let pipeline = ResiliencePipeline::new(
        unlimited_rate_limiter(),
        RetryPolicy::new(5, Backoff::Fixed(Duration::from_secs(60))),
    );
    let script = Script::transient_then(5, 1);
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        }
    };
    let (result, ()) = tokio::join!(
        pipeline.execute_write("delete", &cancel, || script.call()),
        canceller
    );

    assert_eq!(result, Err(PipelineError::Cancelled));
    assert_eq!(script.attempts(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_an_in_flight_call() {
    let pipeline = instant_pipeline(3);
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let canceller = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            cancel.cancel();
        }
    };
    let (result, ()) = tokio::join!(
        pipeline.execute_read(
            "list",
            &cancel,
            || 0_u32,
            || std::future::pending::<Outcome<u32>>()
        ),
        canceller
    );

    assert_eq!(result, Err(PipelineError::Cancelled));
    assert_eq!(started.elapsed(), Duration::from_millis(250));
}

fn constrained_pipeline(permits: u32, timeout: Duration) -> ResiliencePipeline {
    ResiliencePipeline::new(
        Arc::new(RateLimiter::new(RateLimiterConfig {
            limit_for_period: permits,
            refresh_period: Duration::from_secs(1),
            timeout,
        })),
        RetryPolicy::new(1, Backoff::Fixed(Duration::ZERO)),
    )
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn excess_concurrent_reads_fall_back_when_admission_times_out() {
    let pipeline = constrained_pipeline(2, Duration::from_millis(500));
    let counter = AtomicU32::new(0);
    let upstream_calls = &counter;
    let call = move || async move {
        upstream_calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, EmployeeGatewayError>(1_u32)
    };
    let cancel = CancellationToken::new();

    let (first, second, third) = tokio::join!(
        pipeline.execute_read("list", &cancel, || 0, call),
        pipeline.execute_read("list", &cancel, || 0, call),
        pipeline.execute_read("list", &cancel, || 0, call),
    );

    let sources = [first, second, third]
        .into_iter()
        .map(|result| result.expect("reads never fail").source)
        .collect::<Vec<_>>();
    assert_eq!(
        sources
            .iter()
            .filter(|source| **source == ReadSource::Fallback)
            .count(),
        1
    );
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn excess_concurrent_reads_wait_for_the_next_window_within_timeout() {
    let pipeline = constrained_pipeline(2, Duration::from_millis(1_500));
    let started = Instant::now();
    let call = || async { Ok::<_, EmployeeGatewayError>(Instant::now()) };
    let cancel = CancellationToken::new();

    let (first, second, third) = tokio::join!(
        pipeline.execute_read("list", &cancel, Instant::now, call),
        pipeline.execute_read("list", &cancel, Instant::now, call),
        pipeline.execute_read("list", &cancel, Instant::now, call),
    );

    let mut waits = [first, second, third]
        .into_iter()
        .map(|result| {
            let result = result.expect("reads never fail");
            assert!(!result.is_fallback());
            result.value.duration_since(started)
        })
        .collect::<Vec<_>>();
    waits.sort();
    assert_eq!(
        waits,
        vec![Duration::ZERO, Duration::ZERO, Duration::from_secs(1)]
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn admission_rejection_fails_a_write_as_rate_limited() {
    let pipeline = constrained_pipeline(1, Duration::ZERO);
    let cancel = CancellationToken::new();
    pipeline
        .execute_write("create", &cancel, || async { Ok::<_, EmployeeGatewayError>(()) })
        .await
        .expect("first permit");

    let error = pipeline
        .execute_write("create", &cancel, || async { Ok::<_, EmployeeGatewayError>(()) })
        .await
        .expect_err("no permit left");

    match error {
        PipelineError::Upstream(error) => assert_eq!(error.kind(), OutcomeKind::RateLimited),
        PipelineError::Cancelled => panic!("unexpected cancellation"),
    }
}
