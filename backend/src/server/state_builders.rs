//! Builders wiring the upstream adapter, resilience pipeline, and facade.

use std::sync::Arc;

use mockable::DefaultClock;

use employee_gateway::domain::EmployeeFacade;
use employee_gateway::domain::idempotency::IdempotencyCache;
use employee_gateway::domain::resilience::{RateLimiter, ResiliencePipeline};
use employee_gateway::inbound::http::state::HttpState;
use employee_gateway::outbound::employee_api::EmployeeHttpGateway;

use super::ServerConfig;

/// Collaborators shared by every worker.
pub(crate) struct GatewayComponents {
    pub(crate) http_state: HttpState,
    pub(crate) idempotency: Arc<IdempotencyCache>,
}

/// Build the facade and HTTP state from resolved configuration.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the upstream HTTP client cannot be built.
pub(crate) fn build_gateway_components(
    config: &ServerConfig,
) -> std::io::Result<GatewayComponents> {
    let gateway = EmployeeHttpGateway::new(config.upstream_base_url.clone(), config.upstream_timeout)
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    let pipeline = ResiliencePipeline::new(
        Arc::new(RateLimiter::new(config.rate_limiter)),
        config.retry_policy,
    );
    let clock = Arc::new(DefaultClock);
    let idempotency = Arc::new(match config.idempotency_ttl {
        Some(ttl) => IdempotencyCache::with_ttl(clock, ttl),
        None => IdempotencyCache::new(clock),
    });

    let facade = Arc::new(EmployeeFacade::new(
        Arc::new(gateway),
        Arc::new(pipeline),
        Arc::clone(&idempotency),
    ));
    let http_state = HttpState::new(facade.clone(), facade)
        .with_request_deadline(config.request_deadline);

    Ok(GatewayComponents {
        http_state,
        idempotency,
    })
}
