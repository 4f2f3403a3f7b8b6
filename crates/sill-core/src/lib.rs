//! SILL Core: data model, errors, configuration and the API client contract
//!
//! Shared by the catalog engine, the form wizards and the HTTP surface.

pub mod api;
pub mod config;
pub mod error;
pub mod form_data;
pub mod memo;
pub mod model;

pub use api::SillApi;
pub use config::{SearchConfig, SillConfig};
pub use error::{ApiError, Result, SillError};
pub use form_data::{DeclarationFormData, InstanceFormData, SoftwareFormData};
pub use memo::{ByAddress, Memo};
pub use model::{
    AutofillData, Environment, Environments, ExternalEntity, Instance, InstanceId, Prerogative,
    SoftwareId, SoftwareRecord, SoftwareType, SoftwareVersion, StoredPrerogatives, Timestamp,
};

/// Catalog engine version
pub const SILL_VERSION: &str = "1.0.0";
