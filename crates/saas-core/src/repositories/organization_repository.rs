//! Organization repository trait (port)

use async_trait::async_trait;
use crate::domain::{NewOrganization, Organization};
use crate::error::DomainError;

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Organization>, DomainError>;
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Organization>, DomainError>;
    /// Fails with `SubdomainAlreadyExists` when the subdomain is taken.
    async fn create(&self, organization: &NewOrganization) -> Result<Organization, DomainError>;
}
