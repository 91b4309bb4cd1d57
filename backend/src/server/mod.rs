//! Server construction and background task wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::{GatewayComponents, build_gateway_components};

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use employee_gateway::domain::idempotency::IdempotencyCache;
use employee_gateway::inbound::http::employees::employees_scope;
use employee_gateway::inbound::http::health::{HealthState, live, ready};
use employee_gateway::inbound::http::state::HttpState;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .service(employees_scope())
        .service(ready)
        .service(live)
}

/// Periodically drop expired idempotency entries until `stop` is cancelled.
async fn purge_idempotency_entries(
    cache: Arc<IdempotencyCache>,
    every: Duration,
    stop: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            () = stop.cancelled() => break,
            _ = ticker.tick() => {
                let purged = cache.purge_expired();
                debug!(purged, remaining = cache.len(), "idempotency purge completed");
            }
        }
    }
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// When the idempotency cache has a TTL, a purge task runs alongside the
/// server until `shutdown` is cancelled.
///
/// # Errors
/// Propagates [`std::io::Error`] when building the upstream client, binding
/// the socket, or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let GatewayComponents {
        http_state,
        idempotency,
    } = build_gateway_components(&config)?;
    let http_state = web::Data::new(http_state);

    if idempotency.ttl().is_some() {
        actix_web::rt::spawn(purge_idempotency_entries(
            idempotency,
            config.purge_interval,
            shutdown,
        ));
    }

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(config.bind_addr)?
    .run();

    info!(
        bind_addr = %config.bind_addr,
        upstream = %config.upstream_base_url,
        "employee gateway listening"
    );
    health_state.mark_ready();
    Ok(server)
}
