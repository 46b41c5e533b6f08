//! Server construction: adapters, services, and the Actix application.

mod config;

pub use config::{ServiceSettings, SettingsError};

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use fold_backend::domain::ports::SyncChannel;
use fold_backend::domain::{CatalogueQueryService, CatalogueService, SyncDispatcher};
use fold_backend::inbound::http::configure;
use fold_backend::inbound::http::health::{HealthState, live, ready};
use fold_backend::inbound::http::state::HttpState;
use fold_backend::outbound::persistence::{DbPool, DieselCatalogueStore, PoolConfig, PoolError};
use fold_backend::outbound::queue::HttpSyncChannel;

/// Failures while assembling the service.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("failed to build sync channel client: {0}")]
    Channel(#[from] reqwest::Error),
}

fn build_sync_channel(settings: &ServiceSettings) -> Result<Arc<dyn SyncChannel>, StartupError> {
    let endpoint = settings.sync_endpoint()?;
    info!(%endpoint, "publishing sync messages over HTTP");
    Ok(Arc::new(HttpSyncChannel::new(
        endpoint,
        settings.publish_timeout(),
    )?))
}

/// Build the pool, adapters, and use-case services behind the HTTP state.
///
/// # Errors
/// Returns [`StartupError`] when settings are invalid or missing, the pool
/// cannot be built, or the sync channel client cannot be constructed.
pub async fn build_http_state(
    settings: &ServiceSettings,
    shutdown: CancellationToken,
) -> Result<HttpState, StartupError> {
    let pool_config =
        PoolConfig::new(settings.database_url()?).with_max_size(settings.pool_max_size());
    let pool = DbPool::new(pool_config).await?;
    let store = Arc::new(DieselCatalogueStore::new(pool));

    let dispatcher = SyncDispatcher::new(build_sync_channel(settings)?, settings.publish_timeout());
    let commands = CatalogueService::new(store.clone(), dispatcher, Arc::new(DefaultClock));
    let queries = CatalogueQueryService::new(store);

    Ok(HttpState::new(Arc::new(commands), Arc::new(queries)).with_shutdown(shutdown))
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .configure(configure)
        .service(ready)
        .service(live)
}

/// Construct an Actix HTTP server bound to `bind_addr`.
///
/// Signal handling is left to the caller so in-flight units of work can be
/// cancelled before the server drains.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    bind_addr: SocketAddr,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(http_state);

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .disable_signals()
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
