//! Employee gateway entry-point: loads settings, wires the facade, and serves HTTP.

mod server;

use actix_web::web;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use employee_gateway::inbound::http::health::HealthState;
use employee_gateway::settings::GatewaySettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GatewaySettings::load_from_process()?;
    let config = ServerConfig::from_settings(&settings)?;
    info!(bind_addr = %config.bind_addr(), "starting employee gateway");

    let health_state = web::Data::new(HealthState::new());
    let shutdown = CancellationToken::new();
    let _stop_background_tasks = shutdown.clone().drop_guard();
    let server = create_server(health_state.clone(), config, shutdown)?;

    let result = server.await;
    health_state.mark_unhealthy();
    result
}
