//! Instance form: reference a deployment of a catalog software
//!
//! Step 1 names the main software and the other software the instance
//! relies on; step 2 describes who runs it and for whom.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sill_core::{InstanceFormData, InstanceId, Result, SillApi, SillError};

use crate::validation::{optional_url, require_distinct_ids, require_text};
use crate::wizard::{FormSchema, Wizard};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceSoftwares {
    pub main_software_name: String,
    pub other_software_external_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceOrganization {
    pub organization: String,
    pub target_audience: String,
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "camelCase")]
pub enum InstanceStep {
    Softwares(InstanceSoftwares),
    Organization(InstanceOrganization),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceDraft {
    pub softwares: Option<InstanceSoftwares>,
    pub organization: Option<InstanceOrganization>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceFormParams {
    /// New instance, optionally with the main software already chosen
    Create { main_software_name: Option<String> },
    Edit { instance_id: InstanceId },
}

pub struct InstanceSchema;

pub type InstanceForm = Wizard<InstanceSchema>;

async fn require_software(api: &dyn SillApi, name: &str) -> Result<()> {
    let softwares = api.fetch_software_list().await?;
    if softwares.iter().any(|s| s.name == name) {
        Ok(())
    } else {
        Err(SillError::not_found("software", name))
    }
}

#[async_trait]
impl FormSchema for InstanceSchema {
    const NAME: &'static str = "instance";
    const STEP_COUNT: u8 = 2;
    type Params = InstanceFormParams;
    type Target = Option<InstanceId>;
    type Step = InstanceStep;
    type Draft = InstanceDraft;
    type Payload = InstanceFormData;

    fn step_number(step: &InstanceStep) -> u8 {
        match step {
            InstanceStep::Softwares(_) => 1,
            InstanceStep::Organization(_) => 2,
        }
    }

    fn validate(step: &InstanceStep) -> Result<()> {
        match step {
            InstanceStep::Softwares(softwares) => {
                require_text("mainSoftwareName", &softwares.main_software_name)?;
                require_distinct_ids(
                    "otherSoftwareExternalIds",
                    &softwares.other_software_external_ids,
                )
            }
            InstanceStep::Organization(organization) => {
                require_text("organization", &organization.organization)?;
                require_text("targetAudience", &organization.target_audience)?;
                optional_url("publicUrl", organization.public_url.as_deref())
            }
        }
    }

    fn merge(draft: &mut InstanceDraft, step: InstanceStep) {
        match step {
            InstanceStep::Softwares(softwares) => draft.softwares = Some(softwares),
            InstanceStep::Organization(organization) => draft.organization = Some(organization),
        }
    }

    fn complete(_target: &Option<InstanceId>, draft: &InstanceDraft) -> Result<InstanceFormData> {
        let softwares = draft.softwares.clone().ok_or_else(|| {
            SillError::precondition("instance form: softwares step not completed")
        })?;
        let organization = draft.organization.clone().ok_or_else(|| {
            SillError::precondition("instance form: organization step not completed")
        })?;
        Ok(InstanceFormData {
            main_software_name: softwares.main_software_name,
            other_software_external_ids: softwares.other_software_external_ids,
            organization: organization.organization,
            target_audience: organization.target_audience,
            public_url: organization.public_url,
        })
    }

    async fn load(
        api: &dyn SillApi,
        params: InstanceFormParams,
    ) -> Result<(Option<InstanceId>, InstanceDraft)> {
        match params {
            InstanceFormParams::Create { main_software_name: None } => {
                Ok((None, InstanceDraft::default()))
            }
            InstanceFormParams::Create {
                main_software_name: Some(name),
            } => {
                require_software(api, &name).await?;
                let draft = InstanceDraft {
                    softwares: Some(InstanceSoftwares {
                        main_software_name: name,
                        other_software_external_ids: Vec::new(),
                    }),
                    organization: None,
                };
                Ok((None, draft))
            }
            InstanceFormParams::Edit { instance_id } => {
                let instances = api.fetch_instance_list().await?;
                let instance = instances
                    .into_iter()
                    .find(|i| i.id == instance_id)
                    .ok_or_else(|| SillError::not_found("instance", instance_id.to_string()))?;
                let softwares = api.fetch_software_list().await?;
                let main = softwares
                    .iter()
                    .find(|s| s.software_id == instance.main_software_id)
                    .ok_or_else(|| {
                        SillError::not_found("software", instance.main_software_id.to_string())
                    })?;
                debug!(instance_id, main_software = %main.name, "editing instance");

                let draft = InstanceDraft {
                    softwares: Some(InstanceSoftwares {
                        main_software_name: main.name.clone(),
                        other_software_external_ids: instance.other_software_external_ids,
                    }),
                    organization: Some(InstanceOrganization {
                        organization: instance.organization,
                        target_audience: instance.target_audience,
                        public_url: instance.public_url,
                    }),
                };
                Ok((Some(instance_id), draft))
            }
        }
    }

    async fn persist(
        api: &dyn SillApi,
        target: &Option<InstanceId>,
        payload: InstanceFormData,
    ) -> Result<String> {
        require_software(api, &payload.main_software_name).await?;
        let main_software_name = payload.main_software_name.clone();
        match target {
            Some(instance_id) => api.update_instance(*instance_id, payload).await?,
            None => {
                let instance_id = api.create_instance(payload).await?;
                debug!(instance_id, "instance created");
            }
        }
        api.invalidate_instance_list();
        Ok(main_software_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::catalog_api;
    use crate::wizard::{Redirect, SubmitOutcome};
    use sill_client::CachedApiClient;

    fn organization() -> InstanceStep {
        InstanceStep::Organization(InstanceOrganization {
            organization: "CNRS".into(),
            target_audience: "Chercheurs".into(),
            public_url: Some("https://gimp.cnrs.fr".into()),
        })
    }

    #[tokio::test]
    async fn test_create_instance_refreshes_cached_list() {
        let api = CachedApiClient::new(catalog_api());
        assert_eq!(api.fetch_instance_list().await.unwrap().len(), 1);

        let form = InstanceForm::new();
        form.initialize(&api, InstanceFormParams::Create { main_software_name: None })
            .await
            .unwrap();
        form.advance_step(InstanceStep::Softwares(InstanceSoftwares {
            main_software_name: "GIMP".into(),
            other_software_external_ids: vec![],
        }))
        .unwrap();
        let outcome = form.submit(&api, organization()).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Submitted(Redirect {
                software_name: "GIMP".into()
            })
        );

        let instances = api.fetch_instance_list().await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1].main_software_id, 1);
    }

    #[tokio::test]
    async fn test_unknown_main_software_keeps_form() {
        let api = catalog_api();
        let form = InstanceForm::new();
        form.initialize(&api, InstanceFormParams::Create { main_software_name: None })
            .await
            .unwrap();
        form.advance_step(InstanceStep::Softwares(InstanceSoftwares {
            main_software_name: "Photoshop".into(),
            other_software_external_ids: vec![],
        }))
        .unwrap();

        let err = form.submit(&api, organization()).await.unwrap_err();
        assert_eq!(err, SillError::not_found("software", "Photoshop"));
        assert_eq!(form.step(), Some(2));
        assert!(!form.is_submitting());
        assert_eq!(api.write_count(), 0);
    }

    #[tokio::test]
    async fn test_preselected_main_software() {
        let api = catalog_api();
        let form = InstanceForm::new();
        form.initialize(
            &api,
            InstanceFormParams::Create {
                main_software_name: Some("Moodle".into()),
            },
        )
        .await
        .unwrap();
        let draft = form.form_data().unwrap();
        assert_eq!(draft.softwares.unwrap().main_software_name, "Moodle");
        assert!(draft.organization.is_none());
    }

    #[tokio::test]
    async fn test_edit_instance() {
        let api = catalog_api();
        let form = InstanceForm::new();
        form.initialize(&api, InstanceFormParams::Edit { instance_id: 7 })
            .await
            .unwrap();

        let draft = form.form_data().unwrap();
        let softwares = draft.softwares.unwrap();
        assert_eq!(softwares.main_software_name, "Moodle");
        assert_eq!(softwares.other_software_external_ids, vec!["Q8038"]);

        form.advance_step(InstanceStep::Softwares(softwares)).unwrap();
        let mut organization = draft.organization.unwrap();
        organization.target_audience = "Enseignants et élèves".into();
        form.submit(&api, InstanceStep::Organization(organization))
            .await
            .unwrap();

        let instances = api.fetch_instance_list().await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].target_audience, "Enseignants et élèves");
    }

    #[tokio::test]
    async fn test_edit_unknown_instance() {
        let api = catalog_api();
        let form = InstanceForm::new();
        let err = form
            .initialize(&api, InstanceFormParams::Edit { instance_id: 99 })
            .await
            .unwrap_err();
        assert_eq!(err, SillError::not_found("instance", "99"));
    }

    #[test]
    fn test_organization_validation() {
        let step = InstanceStep::Organization(InstanceOrganization {
            organization: "CNRS".into(),
            target_audience: " ".into(),
            public_url: None,
        });
        assert!(matches!(
            InstanceSchema::validate(&step),
            Err(SillError::Validation { field: "targetAudience", .. })
        ));
    }
}
