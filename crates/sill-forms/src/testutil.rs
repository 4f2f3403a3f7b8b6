//! Test doubles for the wizard and autocomplete unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use sill_client::{CatalogSeed, InMemorySillApi};
use sill_core::{
    ApiError, AutofillData, DeclarationFormData, Environment, ExternalEntity, Instance,
    InstanceFormData, InstanceId, Prerogative, SillApi, SoftwareFormData, SoftwareId,
    SoftwareRecord, SoftwareType,
};

/// Counts external lookups; may hold them until released or delay them
pub struct RecordingApi {
    searches: AtomicUsize,
    gated: bool,
    failing: bool,
    delay: Duration,
    called: Notify,
    gate: Notify,
}

impl RecordingApi {
    fn build(gated: bool, failing: bool, delay: Duration) -> Self {
        Self {
            searches: AtomicUsize::new(0),
            gated,
            failing,
            delay,
            called: Notify::new(),
            gate: Notify::new(),
        }
    }

    pub fn new() -> Self {
        Self::build(false, false, Duration::ZERO)
    }

    /// Lookups block until [`RecordingApi::release`]
    pub fn gated() -> Self {
        Self::build(true, false, Duration::ZERO)
    }

    pub fn failing() -> Self {
        Self::build(false, true, Duration::ZERO)
    }

    /// Lookups block until released, then fail
    pub fn gated_failing() -> Self {
        Self::build(true, true, Duration::ZERO)
    }

    /// Lookups answer after `delay`
    pub fn slow(delay: Duration) -> Self {
        Self::build(false, false, delay)
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

fn unsupported() -> ApiError {
    ApiError::Rejected("not supported by the recording api".into())
}

#[async_trait]
impl SillApi for RecordingApi {
    async fn fetch_software_list(&self) -> Result<Vec<SoftwareRecord>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_instance_list(&self) -> Result<Vec<Instance>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_software(&self, _form: SoftwareFormData) -> Result<(), ApiError> {
        Err(unsupported())
    }

    async fn update_software(&self, _id: SoftwareId, _form: SoftwareFormData) -> Result<(), ApiError> {
        Err(unsupported())
    }

    async fn create_instance(&self, _form: InstanceFormData) -> Result<InstanceId, ApiError> {
        Err(unsupported())
    }

    async fn update_instance(&self, _id: InstanceId, _form: InstanceFormData) -> Result<(), ApiError> {
        Err(unsupported())
    }

    async fn create_user_or_referent(
        &self,
        _software_name: &str,
        _declaration: DeclarationFormData,
    ) -> Result<(), ApiError> {
        Err(unsupported())
    }

    async fn search_external_entity(&self, query: &str) -> Result<Vec<ExternalEntity>, ApiError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.gated {
            self.called.notify_one();
            self.gate.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing {
            return Err(ApiError::Network("unreachable".into()));
        }
        Ok(vec![ExternalEntity {
            id: format!("Q-{}", query),
            label: query.to_string(),
            description: String::new(),
        }])
    }

    async fn fetch_autofill_data(&self, _external_id: &str) -> Result<AutofillData, ApiError> {
        Err(unsupported())
    }
}

/// In-memory catalog with two softwares, one instance and autofill data
pub fn catalog_api() -> InMemorySillApi {
    let mut seed = CatalogSeed {
        softwares: vec![
            SoftwareRecord::new(1, "GIMP")
                .with_description("Éditeur d'images")
                .with_environment(Environment::Linux)
                .with_environment(Environment::Mac)
                .with_prerogative(Prerogative::DoRespectRgaa)
                .with_times(100, 200),
            SoftwareRecord::new(2, "Moodle")
                .with_description("Plateforme d'apprentissage")
                .with_environment(Environment::Browser)
                .with_times(300, 300),
        ],
        instances: vec![Instance {
            id: 7,
            main_software_id: 2,
            organization: "Académie de Lyon".into(),
            target_audience: "Enseignants".into(),
            public_url: Some("https://moodle.ac-lyon.fr".into()),
            other_software_external_ids: vec!["Q8038".into()],
            added_time: 400,
            update_time: 400,
        }],
        ..CatalogSeed::default()
    };
    seed.softwares[1].software_type = Some(SoftwareType::Cloud);
    seed.softwares[0].license = "GPL-3.0".into();
    seed.softwares[0].external_id = Some("Q8038".into());
    seed.autofill.insert(
        "Q8041".into(),
        AutofillData {
            name: Some("Inkscape".into()),
            description: Some("Éditeur de graphiques vectoriels".into()),
            license: Some("GPL-2.0".into()),
            logo_url: None,
            keywords: vec!["svg".into()],
        },
    );
    InMemorySillApi::from_seed(seed)
}
