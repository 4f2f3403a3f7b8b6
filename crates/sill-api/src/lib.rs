//! SILL API /v1: read-only REST endpoints over the catalog views
//!
//! | Route | Answer |
//! |---|---|
//! | `GET /v1/softwares` | visible softwares for the query parameters |
//! | `GET /v1/facets` | the four facet sidebars for the same parameters |
//! | `GET /v1/softwares/:name` | one software |
//! | `GET /v1/health` | liveness and catalog state |
//! | `GET /metrics` | prometheus text format |
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use sill_catalog::CatalogStore;
use sill_core::SillApi;

use crate::metrics::ApiMetrics;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CatalogStore>,
    pub api: Arc<dyn SillApi>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(store: CatalogStore, api: Arc<dyn SillApi>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            store: Arc::new(store),
            api,
            metrics: Arc::new(ApiMetrics::new()?),
        })
    }

    /// Load the catalog from the API client
    pub async fn initialize(&self) -> sill_core::Result<bool> {
        self.store.initialize(self.api.as_ref()).await
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/softwares", get(handlers::list_softwares))
        .route("/v1/softwares/:name", get(handlers::get_software))
        .route("/v1/facets", get(handlers::facets))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::log_request))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("SILL API listening on {}", addr);
    axum::serve(listener, app).await
}
