//! Declaration form: a public agent declares themselves user or referent of
//! a catalog software

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sill_core::{DeclarationFormData, Result, SillApi, SillError};

use crate::validation::{optional_url, require_text};
use crate::wizard::{FormSchema, Wizard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationType {
    User,
    Referent,
}

impl DeclarationType {
    pub fn of(data: &DeclarationFormData) -> Self {
        if data.is_referent() {
            Self::Referent
        } else {
            Self::User
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "camelCase")]
pub enum DeclarationStep {
    Type(DeclarationType),
    Details(DeclarationFormData),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationDraft {
    pub declaration_type: Option<DeclarationType>,
    pub details: Option<DeclarationFormData>,
}

pub struct DeclarationSchema;

pub type DeclarationForm = Wizard<DeclarationSchema>;

#[async_trait]
impl FormSchema for DeclarationSchema {
    const NAME: &'static str = "declaration";
    const STEP_COUNT: u8 = 2;
    /// Name of the declared software
    type Params = String;
    type Target = String;
    type Step = DeclarationStep;
    type Draft = DeclarationDraft;
    type Payload = DeclarationFormData;

    fn step_number(step: &DeclarationStep) -> u8 {
        match step {
            DeclarationStep::Type(_) => 1,
            DeclarationStep::Details(_) => 2,
        }
    }

    fn validate(step: &DeclarationStep) -> Result<()> {
        match step {
            DeclarationStep::Type(_) => Ok(()),
            DeclarationStep::Details(DeclarationFormData::User {
                usecase_description,
                version,
                service_url,
                ..
            }) => {
                require_text("usecaseDescription", usecase_description)?;
                require_text("version", version)?;
                optional_url("serviceUrl", service_url.as_deref())
            }
            DeclarationStep::Details(DeclarationFormData::Referent {
                usecase_description,
                service_url,
                ..
            }) => {
                require_text("usecaseDescription", usecase_description)?;
                optional_url("serviceUrl", service_url.as_deref())
            }
        }
    }

    fn merge(draft: &mut DeclarationDraft, step: DeclarationStep) {
        match step {
            DeclarationStep::Type(declaration_type) => {
                if draft.declaration_type != Some(declaration_type) {
                    draft.details = None;
                }
                draft.declaration_type = Some(declaration_type);
            }
            DeclarationStep::Details(details) => draft.details = Some(details),
        }
    }

    fn complete(_software_name: &String, draft: &DeclarationDraft) -> Result<DeclarationFormData> {
        let declaration_type = draft.declaration_type.ok_or_else(|| {
            SillError::precondition("declaration form: type step not completed")
        })?;
        let details = draft.details.clone().ok_or_else(|| {
            SillError::precondition("declaration form: details step not completed")
        })?;
        if DeclarationType::of(&details) != declaration_type {
            return Err(SillError::validation(
                "declarationType",
                format!("details do not match a {:?} declaration", declaration_type),
            ));
        }
        Ok(details)
    }

    async fn load(api: &dyn SillApi, software_name: String) -> Result<(String, DeclarationDraft)> {
        let softwares = api.fetch_software_list().await?;
        if !softwares.iter().any(|s| s.name == software_name) {
            return Err(SillError::not_found("software", software_name));
        }
        Ok((software_name, DeclarationDraft::default()))
    }

    async fn persist(
        api: &dyn SillApi,
        software_name: &String,
        payload: DeclarationFormData,
    ) -> Result<String> {
        api.create_user_or_referent(software_name, payload).await?;
        api.invalidate_software_list();
        Ok(software_name.clone())
    }
}
