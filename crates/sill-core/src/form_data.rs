//! Payloads sent to the API client when a form wizard is submitted
use crate::model::{Environment, SoftwareType};
use serde::{Deserialize, Serialize};

/// Complete software form, create or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareFormData {
    pub software_type: SoftwareType,
    pub external_id: Option<String>,
    pub name: String,
    pub description: String,
    pub license: String,
    pub version_min: Option<String>,
    pub logo_url: Option<String>,
    pub keywords: Vec<String>,
    pub is_present_in_support_contract: bool,
    pub is_from_french_public_service: bool,
    pub do_respect_rgaa: bool,
    pub similar_software_external_ids: Vec<String>,
}

/// Complete instance form, create or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceFormData {
    pub main_software_name: String,
    pub other_software_external_ids: Vec<String>,
    pub organization: String,
    pub target_audience: String,
    pub public_url: Option<String>,
}

/// A public agent declaring themselves user or referent of a software
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "declarationType", rename_all = "camelCase")]
pub enum DeclarationFormData {
    #[serde(rename_all = "camelCase")]
    User {
        usecase_description: String,
        os: Option<Environment>,
        version: String,
        service_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Referent {
        is_technical_expert: bool,
        usecase_description: String,
        service_url: Option<String>,
    },
}

impl DeclarationFormData {
    pub fn is_referent(&self) -> bool {
        matches!(self, Self::Referent { .. })
    }
}
