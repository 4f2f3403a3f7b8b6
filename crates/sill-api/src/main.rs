//! Binary entrypoint for the SILL API server.
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sill_api::{run, AppState};
use sill_catalog::CatalogStore;
use sill_client::{CachedApiClient, CatalogSeed, InMemorySillApi};
use sill_core::SillConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SillConfig::load().context("loading configuration")?;
    let seed = match &config.catalog_path {
        Some(path) => CatalogSeed::from_json_file(path)
            .with_context(|| format!("loading catalog seed {}", path.display()))?,
        None => {
            tracing::warn!("no catalog path configured, serving an empty catalog");
            CatalogSeed::default()
        }
    };

    let api = Arc::new(CachedApiClient::new(InMemorySillApi::from_seed(seed)));
    let state = AppState::new(CatalogStore::new(config.search.clone()), api)
        .context("registering metrics")?;
    state.initialize().await.context("loading catalog")?;

    run(&config.listen_addr, state)
        .await
        .with_context(|| format!("serving on {}", config.listen_addr))
}
