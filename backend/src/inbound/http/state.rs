//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::ports::{CatalogueCommand, CatalogueQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub commands: Arc<dyn CatalogueCommand>,
    pub queries: Arc<dyn CatalogueQuery>,
    shutdown: CancellationToken,
}

impl HttpState {
    /// Construct state from the driving ports.
    pub fn new(commands: Arc<dyn CatalogueCommand>, queries: Arc<dyn CatalogueQuery>) -> Self {
        Self {
            commands,
            queries,
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie every request's unit of work to a server-wide shutdown token.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Token for one request's mutation. Cancelled when the server shuts down.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
