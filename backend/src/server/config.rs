//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use employee_gateway::domain::resilience::{RateLimiterConfig, RetryPolicy};
use employee_gateway::settings::GatewaySettings;
use url::Url;

/// Resolved configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) upstream_base_url: Url,
    pub(crate) upstream_timeout: Duration,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) rate_limiter: RateLimiterConfig,
    pub(crate) idempotency_ttl: Option<Duration>,
    pub(crate) purge_interval: Duration,
    pub(crate) request_deadline: Duration,
}

impl ServerConfig {
    /// Resolve every setting, failing on the first invalid value.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when the bind address or upstream URL is invalid.
    pub fn from_settings(settings: &GatewaySettings) -> std::io::Result<Self> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            upstream_base_url: settings.upstream_base_url()?,
            upstream_timeout: settings.upstream_timeout(),
            retry_policy: settings.retry_policy(),
            rate_limiter: settings.rate_limiter_config(),
            idempotency_ttl: settings.idempotency_ttl(),
            purge_interval: settings.idempotency_purge_interval(),
            request_deadline: settings.request_deadline(),
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
