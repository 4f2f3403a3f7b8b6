//! Catalog seed: the initial content of an in-memory client
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use sill_core::{AutofillData, ExternalEntity, Instance, SillError, SoftwareRecord};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogSeed {
    pub softwares: Vec<SoftwareRecord>,
    pub instances: Vec<Instance>,
    /// Knowledge base answering external entity lookups
    pub external_entities: Vec<ExternalEntity>,
    /// Prefill data keyed by external id
    pub autofill: HashMap<String, AutofillData>,
}

impl CatalogSeed {
    pub fn from_json(json: &str) -> Result<Self, SillError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SillError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SillError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }
}
