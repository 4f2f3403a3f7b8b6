//! Catalog API Client: the external collaborator supplying plain data
//!
//! Everything the catalog core persists or fetches goes through this trait.
//! Implementations may memoize the list endpoints; the `invalidate_*` hooks
//! let writers force the next read to be fresh.
use async_trait::async_trait;

use crate::error::ApiError;
use crate::form_data::{DeclarationFormData, InstanceFormData, SoftwareFormData};
use crate::model::{AutofillData, ExternalEntity, Instance, InstanceId, SoftwareId, SoftwareRecord};

#[async_trait]
pub trait SillApi: Send + Sync {
    /// Every software of the catalog, in catalog order
    async fn fetch_software_list(&self) -> Result<Vec<SoftwareRecord>, ApiError>;

    async fn fetch_instance_list(&self) -> Result<Vec<Instance>, ApiError>;

    async fn create_software(&self, form: SoftwareFormData) -> Result<(), ApiError>;

    async fn update_software(
        &self,
        software_id: SoftwareId,
        form: SoftwareFormData,
    ) -> Result<(), ApiError>;

    /// Returns the id assigned to the new instance
    async fn create_instance(&self, form: InstanceFormData) -> Result<InstanceId, ApiError>;

    async fn update_instance(
        &self,
        instance_id: InstanceId,
        form: InstanceFormData,
    ) -> Result<(), ApiError>;

    async fn create_user_or_referent(
        &self,
        software_name: &str,
        declaration: DeclarationFormData,
    ) -> Result<(), ApiError>;

    /// Free text lookup in the external knowledge base
    async fn search_external_entity(&self, query: &str) -> Result<Vec<ExternalEntity>, ApiError>;

    async fn fetch_autofill_data(&self, external_id: &str) -> Result<AutofillData, ApiError>;

    /// Drop any memoized software list
    fn invalidate_software_list(&self) {}

    /// Drop any memoized instance list
    fn invalidate_instance_list(&self) {}
}
