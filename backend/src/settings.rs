//! Gateway configuration loaded via OrthoConfig.
//!
//! Values are layered from CLI flags, `EMPLOYEE_GATEWAY_*` environment
//! variables, and configuration files. Every field is optional; accessors
//! supply the defaults.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::resilience::{Backoff, RateLimiterConfig, RetryPolicy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8111";
const DEFAULT_UPSTREAM_BASE_URL: &str = "http://localhost:8112/api/v1/";
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_INITIAL_BACKOFF_MS: u64 = 500;
const DEFAULT_RETRY_MAX_BACKOFF_MS: u64 = 5_000;
const DEFAULT_RATE_LIMIT_PERMITS: u32 = 10;
const DEFAULT_RATE_LIMIT_REFRESH_MS: u64 = 1_000;
const DEFAULT_RATE_LIMIT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_IDEMPOTENCY_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_IDEMPOTENCY_PURGE_INTERVAL_SECS: u64 = 300;
const DEFAULT_REQUEST_DEADLINE_MS: u64 = 30_000;

/// Configuration values for the employee gateway process.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EMPLOYEE_GATEWAY")]
pub struct GatewaySettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Root of the upstream employee API.
    pub upstream_base_url: Option<String>,
    /// Per-request timeout for upstream calls, in milliseconds.
    pub upstream_timeout_ms: Option<u64>,
    /// Attempts per upstream call, including the first.
    pub retry_max_attempts: Option<u32>,
    /// First backoff delay, in milliseconds.
    pub retry_initial_backoff_ms: Option<u64>,
    /// Backoff cap for the exponential schedule, in milliseconds.
    pub retry_max_backoff_ms: Option<u64>,
    /// Use an exponential schedule; `false` keeps the initial delay fixed.
    pub retry_exponential: Option<bool>,
    /// Upstream calls admitted per refresh window.
    pub rate_limit_permits: Option<u32>,
    /// Length of one rate-limit window, in milliseconds.
    pub rate_limit_refresh_ms: Option<u64>,
    /// Longest a call may wait for admission, in milliseconds.
    pub rate_limit_timeout_ms: Option<u64>,
    /// Lifetime of idempotency entries, in seconds. Zero keeps them forever.
    pub idempotency_ttl_secs: Option<u64>,
    /// How often expired idempotency entries are purged, in seconds.
    pub idempotency_purge_interval_secs: Option<u64>,
    /// Upper bound on one inbound request, in milliseconds.
    pub request_deadline_ms: Option<u64>,
}

fn invalid(field: &str, value: &str, reason: impl std::fmt::Display) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid {field} '{value}': {reason}"),
    )
}

impl GatewaySettings {
    /// Load settings from the process arguments, environment, and files.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when any layer fails to parse.
    pub fn load_from_process() -> io::Result<Self> {
        Self::load().map_err(|err| io::Error::other(format!("failed to load settings: {err}")))
    }

    /// Parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] for unparsable addresses.
    pub fn bind_addr(&self) -> io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| invalid("bind_addr", raw, err))
    }

    /// Parsed upstream base URL.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] for unparsable URLs or
    /// non-HTTP schemes.
    pub fn upstream_base_url(&self) -> io::Result<Url> {
        let raw = self
            .upstream_base_url
            .as_deref()
            .unwrap_or(DEFAULT_UPSTREAM_BASE_URL);
        let url = Url::parse(raw).map_err(|err| invalid("upstream_base_url", raw, err))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(
                "upstream_base_url",
                raw,
                format!("unsupported scheme {other}"),
            )),
        }
    }

    /// Upstream request timeout.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(
            self.upstream_timeout_ms
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_MS),
        )
    }

    /// Retry policy assembled from the retry fields.
    pub fn retry_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(
            self.retry_initial_backoff_ms
                .unwrap_or(DEFAULT_RETRY_INITIAL_BACKOFF_MS),
        );
        let backoff = if self.retry_exponential.unwrap_or(true) {
            Backoff::Exponential {
                initial,
                max: Duration::from_millis(
                    self.retry_max_backoff_ms
                        .unwrap_or(DEFAULT_RETRY_MAX_BACKOFF_MS),
                ),
            }
        } else {
            Backoff::Fixed(initial)
        };
        RetryPolicy::new(
            self.retry_max_attempts
                .unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS),
            backoff,
        )
    }

    /// Rate limiter configuration assembled from the rate-limit fields.
    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            limit_for_period: self
                .rate_limit_permits
                .unwrap_or(DEFAULT_RATE_LIMIT_PERMITS),
            refresh_period: Duration::from_millis(
                self.rate_limit_refresh_ms
                    .unwrap_or(DEFAULT_RATE_LIMIT_REFRESH_MS),
            ),
            timeout: Duration::from_millis(
                self.rate_limit_timeout_ms
                    .unwrap_or(DEFAULT_RATE_LIMIT_TIMEOUT_MS),
            ),
        }
    }

    /// Idempotency entry lifetime; `None` disables eviction.
    pub fn idempotency_ttl(&self) -> Option<Duration> {
        match self
            .idempotency_ttl_secs
            .unwrap_or(DEFAULT_IDEMPOTENCY_TTL_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Interval between idempotency purges. Never shorter than one second.
    pub fn idempotency_purge_interval(&self) -> Duration {
        Duration::from_secs(
            self.idempotency_purge_interval_secs
                .unwrap_or(DEFAULT_IDEMPOTENCY_PURGE_INTERVAL_SECS)
                .max(1),
        )
    }

    /// Deadline applied to each inbound request.
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(
            self.request_deadline_ms
                .unwrap_or(DEFAULT_REQUEST_DEADLINE_MS),
        )
    }
}
