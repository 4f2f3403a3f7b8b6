//! Debounced external entity lookup
//!
//! Every keystroke calls [`Autocomplete::lookup`]. The request waits for the
//! debounce delay, then queries the knowledge base. Requests are numbered;
//! one that is no longer the latest when its delay ends, or when its
//! response arrives, resolves to [`Lookup::Superseded`] so that a slow
//! response never overwrites a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use sill_core::{ExternalEntity, Result, SillApi, SillConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Results(Vec<ExternalEntity>),
    /// A newer lookup was issued meanwhile
    Superseded,
}

pub struct Autocomplete {
    api: Arc<dyn SillApi>,
    debounce: Duration,
    latest: AtomicU64,
}

impl Autocomplete {
    pub fn new(api: Arc<dyn SillApi>, debounce: Duration) -> Self {
        Self {
            api,
            debounce,
            latest: AtomicU64::new(0),
        }
    }

    pub fn from_config(api: Arc<dyn SillApi>, config: &SillConfig) -> Self {
        Self::new(api, Duration::from_millis(config.autocomplete_debounce_ms))
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn is_latest(&self, sequence: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == sequence
    }

    pub async fn lookup(&self, query: &str) -> Result<Lookup> {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;
        if !self.is_latest(sequence) {
            return Ok(Lookup::Superseded);
        }

        let query = query.trim();
        if query.is_empty() {
            return Ok(Lookup::Results(Vec::new()));
        }

        let results = self.api.search_external_entity(query).await?;
        if !self.is_latest(sequence) {
            debug!(sequence, query, "stale lookup response dropped");
            return Ok(Lookup::Superseded);
        }
        debug!(sequence, query, count = results.len(), "lookup answered");
        Ok(Lookup::Results(results))
    }

    /// Invalidate every pending lookup (input cleared or closed)
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
