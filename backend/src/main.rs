//! Backend entry-point: loads settings, wires adapters, and serves the
//! catalogue API.

mod server;

use actix_web::web;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fold_backend::inbound::http::health::HealthState;
use ortho_config::OrthoConfig;
use server::{ServiceSettings, build_http_state, create_server};

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

    let settings = ServiceSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;

    let shutdown = CancellationToken::new();
    let http_state = build_http_state(&settings, shutdown.clone())
        .await
        .map_err(std::io::Error::other)?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), http_state, bind_addr)?;
    let handle = server.handle();

    actix_web::rt::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown requested");
        health_state.mark_unhealthy();
        shutdown.cancel();
        handle.stop(true).await;
    });

    info!(%bind_addr, "catalogue service listening");
    server.await
}
