//! Memoizing API client
//!
//! Wraps any [`SillApi`] and keeps the last software and instance lists.
//! Successful writes drop the affected list; so does an explicit
//! `invalidate_*` call. A fetch that was in flight while the list was
//! invalidated is returned to its caller but not cached.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

use sill_core::{
    ApiError, AutofillData, DeclarationFormData, ExternalEntity, Instance, InstanceFormData,
    InstanceId, SillApi, SoftwareFormData, SoftwareId, SoftwareRecord,
};

struct ListCache<T> {
    slot: Mutex<Option<Vec<T>>>,
    generation: AtomicU64,
}

impl<T: Clone> ListCache<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    fn get(&self) -> Option<Vec<T>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `value` unless the cache was invalidated since `generation`
    fn store(&self, generation: u64, value: &[T]) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) == generation {
            *slot = Some(value.to_vec());
        }
    }

    fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        *slot = None;
    }

    fn is_cached(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

pub struct CachedApiClient<C> {
    inner: C,
    softwares: ListCache<SoftwareRecord>,
    instances: ListCache<Instance>,
}

impl<C: SillApi> CachedApiClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            softwares: ListCache::new(),
            instances: ListCache::new(),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn is_software_list_cached(&self) -> bool {
        self.softwares.is_cached()
    }

    pub fn is_instance_list_cached(&self) -> bool {
        self.instances.is_cached()
    }
}

#[async_trait]
impl<C: SillApi> SillApi for CachedApiClient<C> {
    async fn fetch_software_list(&self) -> Result<Vec<SoftwareRecord>, ApiError> {
        if let Some(list) = self.softwares.get() {
            return Ok(list);
        }
        let generation = self.softwares.generation();
        let list = self.inner.fetch_software_list().await?;
        self.softwares.store(generation, &list);
        debug!(count = list.len(), "software list cached");
        Ok(list)
    }

    async fn fetch_instance_list(&self) -> Result<Vec<Instance>, ApiError> {
        if let Some(list) = self.instances.get() {
            return Ok(list);
        }
        let generation = self.instances.generation();
        let list = self.inner.fetch_instance_list().await?;
        self.instances.store(generation, &list);
        Ok(list)
    }

    async fn create_software(&self, form: SoftwareFormData) -> Result<(), ApiError> {
        self.inner.create_software(form).await?;
        self.softwares.invalidate();
        Ok(())
    }

    async fn update_software(
        &self,
        software_id: SoftwareId,
        form: SoftwareFormData,
    ) -> Result<(), ApiError> {
        self.inner.update_software(software_id, form).await?;
        self.softwares.invalidate();
        Ok(())
    }

    async fn create_instance(&self, form: InstanceFormData) -> Result<InstanceId, ApiError> {
        let id = self.inner.create_instance(form).await?;
        self.instances.invalidate();
        Ok(id)
    }

    async fn update_instance(
        &self,
        instance_id: InstanceId,
        form: InstanceFormData,
    ) -> Result<(), ApiError> {
        self.inner.update_instance(instance_id, form).await?;
        self.instances.invalidate();
        Ok(())
    }

    async fn create_user_or_referent(
        &self,
        software_name: &str,
        declaration: DeclarationFormData,
    ) -> Result<(), ApiError> {
        self.inner
            .create_user_or_referent(software_name, declaration)
            .await?;
        // user and referent counts live on the software records
        self.softwares.invalidate();
        Ok(())
    }

    async fn search_external_entity(&self, query: &str) -> Result<Vec<ExternalEntity>, ApiError> {
        self.inner.search_external_entity(query).await
    }

    async fn fetch_autofill_data(&self, external_id: &str) -> Result<AutofillData, ApiError> {
        self.inner.fetch_autofill_data(external_id).await
    }

    fn invalidate_software_list(&self) {
        self.softwares.invalidate();
        self.inner.invalidate_software_list();
    }

    fn invalidate_instance_list(&self) {
        self.instances.invalidate();
        self.inner.invalidate_instance_list();
    }
}
