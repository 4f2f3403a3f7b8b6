//! Software form: declare or edit a catalog software in four steps
//!
//! 1. software type and supported operating systems
//! 2. identity (external id, name, description, license, minimal version,
//!    logo, keywords), optionally prefilled from the knowledge base
//! 3. prerogatives
//! 4. similar software, by external id

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sill_core::{
    AutofillData, Environment, Result, SillApi, SillError, SoftwareFormData, SoftwareId,
    SoftwareRecord, SoftwareType,
};

use crate::validation::{optional_url, require_desktop_os, require_distinct_ids, require_text};
use crate::wizard::{FormSchema, Wizard};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoftwareIdentity {
    pub external_id: Option<String>,
    pub name: String,
    pub description: String,
    pub license: String,
    pub version_min: Option<String>,
    pub logo_url: Option<String>,
    pub keywords: Vec<String>,
}

impl SoftwareIdentity {
    /// Copy knowledge-base values into the fields left empty
    pub fn fill_from(&mut self, data: AutofillData) {
        fn fill(field: &mut String, value: Option<String>) {
            if field.trim().is_empty() {
                if let Some(value) = value {
                    *field = value;
                }
            }
        }

        fill(&mut self.name, data.name);
        fill(&mut self.description, data.description);
        fill(&mut self.license, data.license);
        if self.logo_url.is_none() {
            self.logo_url = data.logo_url;
        }
        if self.keywords.is_empty() {
            self.keywords = data.keywords;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoftwarePrerogatives {
    pub is_present_in_support_contract: bool,
    pub is_from_french_public_service: bool,
    pub do_respect_rgaa: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "camelCase")]
pub enum SoftwareStep {
    Type(SoftwareType),
    Identity(SoftwareIdentity),
    Prerogatives(SoftwarePrerogatives),
    SimilarSoftwares(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftwareDraft {
    pub software_type: Option<SoftwareType>,
    pub identity: Option<SoftwareIdentity>,
    pub prerogatives: Option<SoftwarePrerogatives>,
    pub similar_software_external_ids: Option<Vec<String>>,
}

impl SoftwareDraft {
    /// Every step prefilled from an existing record
    pub fn from_record(record: &SoftwareRecord) -> Self {
        let software_type = record.software_type.unwrap_or_else(|| {
            let envs = record.environments;
            if Environment::ALL.iter().any(|e| e.is_desktop() && envs.get(*e)) || envs.smartphone {
                SoftwareType::Desktop { os: envs }
            } else if envs.browser {
                SoftwareType::Cloud
            } else {
                SoftwareType::Stack
            }
        });
        Self {
            software_type: Some(software_type),
            identity: Some(SoftwareIdentity {
                external_id: record.external_id.clone(),
                name: record.name.clone(),
                description: record.description.clone(),
                license: record.license.clone(),
                version_min: record.version_min.clone(),
                logo_url: record.logo_url.clone(),
                keywords: record.keywords.clone(),
            }),
            prerogatives: Some(SoftwarePrerogatives {
                is_present_in_support_contract: record.prerogatives.is_present_in_support_contract,
                is_from_french_public_service: record.prerogatives.is_from_french_public_services,
                do_respect_rgaa: record.prerogatives.do_respect_rgaa,
            }),
            similar_software_external_ids: Some(record.similar_software_external_ids.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftwareFormParams {
    Create,
    Edit { software_name: String },
}

pub struct SoftwareSchema;

pub type SoftwareForm = Wizard<SoftwareSchema>;

fn missing(step: &str) -> SillError {
    SillError::precondition(format!("software form: {} step not completed", step))
}

#[async_trait]
impl FormSchema for SoftwareSchema {
    const NAME: &'static str = "software";
    const STEP_COUNT: u8 = 4;
    type Params = SoftwareFormParams;
    /// Id of the edited software, `None` when creating
    type Target = Option<SoftwareId>;
    type Step = SoftwareStep;
    type Draft = SoftwareDraft;
    type Payload = SoftwareFormData;

    fn step_number(step: &SoftwareStep) -> u8 {
        match step {
            SoftwareStep::Type(_) => 1,
            SoftwareStep::Identity(_) => 2,
            SoftwareStep::Prerogatives(_) => 3,
            SoftwareStep::SimilarSoftwares(_) => 4,
        }
    }

    fn validate(step: &SoftwareStep) -> Result<()> {
        match step {
            SoftwareStep::Type(SoftwareType::Desktop { os }) => require_desktop_os(os),
            SoftwareStep::Type(_) => Ok(()),
            SoftwareStep::Identity(identity) => {
                require_text("name", &identity.name)?;
                require_text("description", &identity.description)?;
                require_text("license", &identity.license)?;
                if let Some(external_id) = &identity.external_id {
                    require_text("externalId", external_id)?;
                }
                if let Some(version) = &identity.version_min {
                    require_text("versionMin", version)?;
                }
                optional_url("logoUrl", identity.logo_url.as_deref())?;
                identity
                    .keywords
                    .iter()
                    .try_for_each(|keyword| require_text("keywords", keyword))
            }
            SoftwareStep::Prerogatives(_) => Ok(()),
            SoftwareStep::SimilarSoftwares(ids) => {
                require_distinct_ids("similarSoftwareExternalIds", ids)
            }
        }
    }

    fn merge(draft: &mut SoftwareDraft, step: SoftwareStep) {
        match step {
            SoftwareStep::Type(software_type) => draft.software_type = Some(software_type),
            SoftwareStep::Identity(identity) => draft.identity = Some(identity),
            SoftwareStep::Prerogatives(prerogatives) => draft.prerogatives = Some(prerogatives),
            SoftwareStep::SimilarSoftwares(ids) => draft.similar_software_external_ids = Some(ids),
        }
    }

    fn complete(_target: &Option<SoftwareId>, draft: &SoftwareDraft) -> Result<SoftwareFormData> {
        let software_type = draft.software_type.ok_or_else(|| missing("type"))?;
        let identity = draft.identity.clone().ok_or_else(|| missing("identity"))?;
        let prerogatives = draft.prerogatives.ok_or_else(|| missing("prerogatives"))?;
        let similar = draft
            .similar_software_external_ids
            .clone()
            .ok_or_else(|| missing("similar software"))?;

        Ok(SoftwareFormData {
            software_type,
            external_id: identity.external_id,
            name: identity.name.trim().to_string(),
            description: identity.description,
            license: identity.license,
            version_min: identity.version_min,
            logo_url: identity.logo_url,
            keywords: identity.keywords,
            is_present_in_support_contract: prerogatives.is_present_in_support_contract,
            is_from_french_public_service: prerogatives.is_from_french_public_service,
            do_respect_rgaa: prerogatives.do_respect_rgaa,
            similar_software_external_ids: similar,
        })
    }

    async fn load(
        api: &dyn SillApi,
        params: SoftwareFormParams,
    ) -> Result<(Option<SoftwareId>, SoftwareDraft)> {
        match params {
            SoftwareFormParams::Create => Ok((None, SoftwareDraft::default())),
            SoftwareFormParams::Edit { software_name } => {
                let softwares = api.fetch_software_list().await?;
                let record = softwares
                    .iter()
                    .find(|s| s.name == software_name)
                    .ok_or_else(|| SillError::not_found("software", software_name.as_str()))?;
                debug!(software_id = record.software_id, "editing software");
                Ok((Some(record.software_id), SoftwareDraft::from_record(record)))
            }
        }
    }

    async fn persist(
        api: &dyn SillApi,
        target: &Option<SoftwareId>,
        payload: SoftwareFormData,
    ) -> Result<String> {
        let name = payload.name.clone();
        match target {
            Some(software_id) => api.update_software(*software_id, payload).await?,
            None => api.create_software(payload).await?,
        }
        api.invalidate_software_list();
        Ok(name)
    }
}

/// Prefill the identity step from the knowledge base entry it points to
pub async fn autofill_identity(
    api: &dyn SillApi,
    mut identity: SoftwareIdentity,
) -> Result<SoftwareIdentity> {
    let external_id = match identity.external_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(SillError::validation("externalId", "required for autofill")),
    };
    let data = api.fetch_autofill_data(&external_id).await?;
    identity.fill_from(data);
    Ok(identity)
}
