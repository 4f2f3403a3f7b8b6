//! In-memory Catalog API Client
//!
//! Serves a seeded catalog and applies writes to it. Used by the HTTP
//! surface and as the collaborator in tests; failures can be injected to
//! exercise recovery paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, info};

use sill_core::model::now_millis;
use sill_core::{
    ApiError, AutofillData, DeclarationFormData, ExternalEntity, Instance, InstanceFormData,
    InstanceId, SillApi, SoftwareFormData, SoftwareId, SoftwareRecord, StoredPrerogatives,
};

use crate::seed::CatalogSeed;

/// Maximum number of entities returned by one external lookup
pub const MAX_EXTERNAL_RESULTS: usize = 10;

struct Inner {
    softwares: Vec<SoftwareRecord>,
    instances: Vec<Instance>,
    external_entities: Vec<ExternalEntity>,
    autofill: HashMap<String, AutofillData>,
    next_software_id: SoftwareId,
    next_instance_id: InstanceId,
}

impl Inner {
    fn software_by_name(&self, name: &str) -> Result<&SoftwareRecord, ApiError> {
        self.softwares
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ApiError::NotFound(format!("software '{}'", name)))
    }
}

pub struct InMemorySillApi {
    inner: RwLock<Inner>,
    software_fetches: AtomicUsize,
    instance_fetches: AtomicUsize,
    writes: AtomicUsize,
    fail_next: Mutex<Option<ApiError>>,
}

impl InMemorySillApi {
    pub fn new() -> Self {
        Self::from_seed(CatalogSeed::default())
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let next_software_id = seed.softwares.iter().map(|s| s.software_id).max().unwrap_or(0) + 1;
        let next_instance_id = seed.instances.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        info!(
            softwares = seed.softwares.len(),
            instances = seed.instances.len(),
            "in-memory catalog seeded"
        );
        Self {
            inner: RwLock::new(Inner {
                softwares: seed.softwares,
                instances: seed.instances,
                external_entities: seed.external_entities,
                autofill: seed.autofill,
                next_software_id,
                next_instance_id,
            }),
            software_fetches: AtomicUsize::new(0),
            instance_fetches: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next call (of any kind) fail with `error`
    pub fn fail_next_call(&self, error: ApiError) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    pub fn software_fetch_count(&self) -> usize {
        self.software_fetches.load(Ordering::SeqCst)
    }

    pub fn instance_fetch_count(&self) -> usize {
        self.instance_fetches.load(Ordering::SeqCst)
    }

    /// Number of accepted or attempted writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn injected_failure(&self) -> Result<(), ApiError> {
        match self.fail_next.lock().unwrap_or_else(|e| e.into_inner()).take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn begin_write(&self) -> Result<(), ApiError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()
    }
}

impl Default for InMemorySillApi {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_form(record: &mut SoftwareRecord, form: SoftwareFormData) {
    record.name = form.name;
    record.description = form.description;
    record.license = form.license;
    record.version_min = form.version_min;
    record.logo_url = form.logo_url;
    record.keywords = form.keywords;
    record.external_id = form.external_id;
    record.environments = form.software_type.environments();
    record.software_type = Some(form.software_type);
    record.prerogatives = StoredPrerogatives {
        is_present_in_support_contract: form.is_present_in_support_contract,
        is_from_french_public_services: form.is_from_french_public_service,
        do_respect_rgaa: form.do_respect_rgaa,
    };
    record.similar_software_external_ids = form.similar_software_external_ids;
}

#[async_trait]
impl SillApi for InMemorySillApi {
    async fn fetch_software_list(&self) -> Result<Vec<SoftwareRecord>, ApiError> {
        self.software_fetches.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        Ok(self.inner.read().await.softwares.clone())
    }

    async fn fetch_instance_list(&self) -> Result<Vec<Instance>, ApiError> {
        self.instance_fetches.fetch_add(1, Ordering::SeqCst);
        self.injected_failure()?;
        Ok(self.inner.read().await.instances.clone())
    }

    async fn create_software(&self, form: SoftwareFormData) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut inner = self.inner.write().await;
        if inner.softwares.iter().any(|s| s.name == form.name) {
            return Err(ApiError::Rejected(format!("software '{}' already exists", form.name)));
        }

        let now = now_millis();
        let mut record = SoftwareRecord::new(inner.next_software_id, form.name.clone())
            .with_times(now, now);
        apply_form(&mut record, form);
        inner.next_software_id += 1;
        debug!(software_id = record.software_id, name = %record.name, "software created");
        inner.softwares.push(record);
        Ok(())
    }

    async fn update_software(
        &self,
        software_id: SoftwareId,
        form: SoftwareFormData,
    ) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut inner = self.inner.write().await;
        if inner
            .softwares
            .iter()
            .any(|s| s.name == form.name && s.software_id != software_id)
        {
            return Err(ApiError::Rejected(format!("software '{}' already exists", form.name)));
        }
        let record = inner
            .softwares
            .iter_mut()
            .find(|s| s.software_id == software_id)
            .ok_or_else(|| ApiError::NotFound(format!("software #{}", software_id)))?;
        apply_form(record, form);
        record.update_time = now_millis();
        debug!(software_id, "software updated");
        Ok(())
    }

    async fn create_instance(&self, form: InstanceFormData) -> Result<InstanceId, ApiError> {
        self.begin_write()?;
        let mut inner = self.inner.write().await;
        let main_software_id = inner.software_by_name(&form.main_software_name)?.software_id;

        let now = now_millis();
        let id = inner.next_instance_id;
        inner.next_instance_id += 1;
        inner.instances.push(Instance {
            id,
            main_software_id,
            organization: form.organization,
            target_audience: form.target_audience,
            public_url: form.public_url,
            other_software_external_ids: form.other_software_external_ids,
            added_time: now,
            update_time: now,
        });
        debug!(instance_id = id, main_software_id, "instance created");
        Ok(id)
    }

    async fn update_instance(
        &self,
        instance_id: InstanceId,
        form: InstanceFormData,
    ) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut inner = self.inner.write().await;
        let main_software_id = inner.software_by_name(&form.main_software_name)?.software_id;
        let instance = inner
            .instances
            .iter_mut()
            .find(|i| i.id == instance_id)
            .ok_or_else(|| ApiError::NotFound(format!("instance #{}", instance_id)))?;
        instance.main_software_id = main_software_id;
        instance.organization = form.organization;
        instance.target_audience = form.target_audience;
        instance.public_url = form.public_url;
        instance.other_software_external_ids = form.other_software_external_ids;
        instance.update_time = now_millis();
        Ok(())
    }

    async fn create_user_or_referent(
        &self,
        software_name: &str,
        declaration: DeclarationFormData,
    ) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut inner = self.inner.write().await;
        let record = inner
            .softwares
            .iter_mut()
            .find(|s| s.name == software_name)
            .ok_or_else(|| ApiError::NotFound(format!("software '{}'", software_name)))?;
        if declaration.is_referent() {
            record.referent_count += 1;
        } else {
            record.user_count += 1;
        }
        debug!(software = software_name, referent = declaration.is_referent(), "declaration recorded");
        Ok(())
    }

    async fn search_external_entity(&self, query: &str) -> Result<Vec<ExternalEntity>, ApiError> {
        self.injected_failure()?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().await;
        Ok(inner
            .external_entities
            .iter()
            .filter(|e| {
                e.label.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .take(MAX_EXTERNAL_RESULTS)
            .cloned()
            .collect())
    }

    async fn fetch_autofill_data(&self, external_id: &str) -> Result<AutofillData, ApiError> {
        self.injected_failure()?;
        self.inner
            .read()
            .await
            .autofill
            .get(external_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("external entity '{}'", external_id)))
    }
}
