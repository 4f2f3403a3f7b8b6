//! Shared fixtures for the unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use sill_core::{
    ApiError, AutofillData, DeclarationFormData, Environment, ExternalEntity, Instance,
    InstanceFormData, InstanceId, Prerogative, SillApi, SoftwareFormData, SoftwareId,
    SoftwareRecord,
};

use crate::RecordList;

pub fn sample_records() -> Vec<SoftwareRecord> {
    vec![
        SoftwareRecord::new(101, "LibreOffice")
            .with_description("Suite bureautique")
            .with_category("office")
            .with_organization("DINUM")
            .with_organization("Ministère")
            .with_environment(Environment::Linux)
            .with_environment(Environment::Windows)
            .with_environment(Environment::Mac)
            .with_prerogative(Prerogative::DoRespectRgaa)
            .with_prerogative(Prerogative::IsPresentInSupportContract)
            .with_counts(50, 5)
            .with_times(1000, 5000)
            .with_last_version("7.6.0", 4000),
        SoftwareRecord::new(102, "Thunderbird")
            .with_description("Client de messagerie")
            .with_category("mail")
            .with_organization("DINUM")
            .with_environment(Environment::Linux)
            .with_environment(Environment::Windows)
            .with_counts(30, 2)
            .with_times(2000, 3000),
        SoftwareRecord::new(103, "GIMP")
            .with_description("Éditeur d'images")
            .with_category("graphics")
            .with_organization("CNRS")
            .with_environment(Environment::Linux)
            .with_environment(Environment::Mac)
            .with_counts(10, 1)
            .with_times(3000, 1000)
            .with_last_version("2.10", 2000),
        SoftwareRecord::new(104, "Inkscape")
            .with_description("Éditeur de graphiques vectoriels")
            .with_category("graphics")
            .with_category("drawing")
            .with_organization("CNRS")
            .with_environment(Environment::Windows)
            .with_prerogative(Prerogative::IsPresentInSupportContract)
            .with_counts(10, 3)
            .with_times(4000, 2000)
            .with_last_version("1.3", 6000),
        SoftwareRecord::new(105, "VLC")
            .with_description("Lecteur multimédia")
            .with_category("media")
            .with_environment(Environment::Linux)
            .with_environment(Environment::Windows)
            .with_environment(Environment::Mac)
            .with_environment(Environment::Smartphone)
            .with_counts(30, 0)
            .with_times(5000, 4000)
            .with_last_version("3.0.20", 5000),
        SoftwareRecord::new(106, "Moodle")
            .with_description("Plateforme d'apprentissage")
            .with_category("education")
            .with_organization("Éducation nationale")
            .with_environment(Environment::Browser)
            .with_prerogative(Prerogative::DoRespectRgaa)
            .with_prerogative(Prerogative::IsFromFrenchPublicServices)
            .with_counts(5, 2)
            .with_times(6000, 6000),
    ]
}

pub fn sample_catalog() -> RecordList {
    sample_records()
        .into_iter()
        .map(Arc::new)
        .collect::<Vec<_>>()
        .into()
}

/// Read-only API serving a fixed software list
pub struct StaticApi {
    records: Result<Vec<SoftwareRecord>, ApiError>,
    fetches: AtomicUsize,
    gated: bool,
    called: Notify,
    gate: Notify,
}

impl StaticApi {
    fn build(records: Result<Vec<SoftwareRecord>, ApiError>, gated: bool) -> Self {
        Self {
            records,
            fetches: AtomicUsize::new(0),
            gated,
            called: Notify::new(),
            gate: Notify::new(),
        }
    }

    pub fn new(records: Vec<SoftwareRecord>) -> Self {
        Self::build(Ok(records), false)
    }

    pub fn failing(error: ApiError) -> Self {
        Self::build(Err(error), false)
    }

    /// Fetches block until [`StaticApi::release`]
    pub fn gated(records: Vec<SoftwareRecord>) -> Self {
        Self::build(Ok(records), true)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

fn read_only() -> ApiError {
    ApiError::Rejected("read-only test api".into())
}

#[async_trait]
impl SillApi for StaticApi {
    async fn fetch_software_list(&self) -> Result<Vec<SoftwareRecord>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.gated {
            self.called.notify_one();
            self.gate.notified().await;
        }
        self.records.clone()
    }

    async fn fetch_instance_list(&self) -> Result<Vec<Instance>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_software(&self, _form: SoftwareFormData) -> Result<(), ApiError> {
        Err(read_only())
    }

    async fn update_software(&self, _id: SoftwareId, _form: SoftwareFormData) -> Result<(), ApiError> {
        Err(read_only())
    }

    async fn create_instance(&self, _form: InstanceFormData) -> Result<InstanceId, ApiError> {
        Err(read_only())
    }

    async fn update_instance(&self, _id: InstanceId, _form: InstanceFormData) -> Result<(), ApiError> {
        Err(read_only())
    }

    async fn create_user_or_referent(
        &self,
        _software_name: &str,
        _declaration: DeclarationFormData,
    ) -> Result<(), ApiError> {
        Err(read_only())
    }

    async fn search_external_entity(&self, _query: &str) -> Result<Vec<ExternalEntity>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_autofill_data(&self, _external_id: &str) -> Result<AutofillData, ApiError> {
        Ok(AutofillData::default())
    }
}
