//! Runtime configuration
//!
//! Read from an optional YAML file, then overridden by environment variables.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SillError;

/// YAML file read by [`SillConfig::load`] when set
pub const CONFIG_PATH_VAR: &str = "SILL_CONFIG";
pub const ADDR_VAR: &str = "SILL_ADDR";
pub const CATALOG_PATH_VAR: &str = "SILL_CATALOG_PATH";
pub const DEBOUNCE_VAR: &str = "SILL_AUTOCOMPLETE_DEBOUNCE_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SillConfig {
    /// Address the HTTP surface listens on
    pub listen_addr: String,
    /// JSON seed with `softwares` and `instances` arrays
    pub catalog_path: Option<PathBuf>,
    /// Delay before a typed query is sent to the external lookup
    pub autocomplete_debounce_ms: u64,
    pub search: SearchConfig,
}

/// Tuning of the fuzzy catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum edit distance between a query token and a record word
    pub max_edit_distance: usize,
    /// Shorter query tokens must match as substrings
    pub min_fuzzy_token_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: 1,
            min_fuzzy_token_len: 4,
        }
    }
}

impl Default for SillConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8787".to_string(),
            catalog_path: None,
            autocomplete_debounce_ms: 300,
            search: SearchConfig::default(),
        }
    }
}

impl SillConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, SillError> {
        serde_yaml::from_str(yaml).map_err(|e| SillError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, SillError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SillError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&raw)
    }

    /// File named by `SILL_CONFIG` (or defaults), then env overrides
    pub fn load() -> Result<Self, SillError> {
        let base = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by variable name
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SillError> {
        if let Some(addr) = lookup(ADDR_VAR) {
            self.listen_addr = addr;
        }
        if let Some(path) = lookup(CATALOG_PATH_VAR) {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(ms) = lookup(DEBOUNCE_VAR) {
            self.autocomplete_debounce_ms = ms
                .parse()
                .map_err(|_| SillError::Config(format!("{} must be an integer, got '{}'", DEBOUNCE_VAR, ms)))?;
        }
        tracing::debug!(addr = %self.listen_addr, "configuration resolved");
        Ok(self)
    }
}
