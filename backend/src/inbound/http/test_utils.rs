//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use super::configure;
use super::state::HttpState;
use crate::domain::ports::{MockCatalogueCommand, MockCatalogueQuery};

/// Application with the catalogue routes bound to the given mocks.
pub fn test_app(
    commands: MockCatalogueCommand,
    queries: MockCatalogueQuery,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(Arc::new(commands), Arc::new(queries));
    App::new()
        .app_data(web::Data::new(state))
        .configure(configure)
}
