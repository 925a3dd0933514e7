//! Axum HTTP adapter over the revenue engine.

use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::config::WebConfig;
use crate::engine::RevenueEngine;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::store::RevenueStore;

use super::routes;

/// Shared state for all web routes.
pub struct AppState<L, S> {
    pub engine: Arc<RevenueEngine<L, S>>,
}

impl<L, S> Clone for AppState<L, S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

/// Build the full application router.
pub fn app<L: Ledger, S: RevenueStore>(engine: Arc<RevenueEngine<L, S>>) -> Router {
    routes::api_routes::<L, S>().with_state(AppState { engine })
}

pub struct WebServer<L, S> {
    config: WebConfig,
    engine: Arc<RevenueEngine<L, S>>,
}

impl<L: Ledger, S: RevenueStore> WebServer<L, S> {
    pub fn new(config: WebConfig, engine: Arc<RevenueEngine<L, S>>) -> Self {
        Self { config, engine }
    }

    /// Start the HTTP server.
    pub async fn start(self) -> Result<()> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.port));
        info!(port = self.config.port, "revenue api starting");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app(self.engine)).await?;

        Ok(())
    }
}
