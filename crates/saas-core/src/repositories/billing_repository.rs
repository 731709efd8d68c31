//! Billing repository trait (port)

use async_trait::async_trait;
use crate::domain::{Billing, NewBilling};
use crate::error::DomainError;

/// Active billing row joined with the organization's team.
#[derive(Debug, Clone)]
pub struct ActiveBillingLink {
    pub billing: Billing,
    pub team_id: i32,
}

#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn find_active_by_organization(&self, organization_id: i32) -> Result<Option<Billing>, DomainError>;
    async fn find_active_by_customer(&self, customer_id: &str) -> Result<Option<ActiveBillingLink>, DomainError>;
    /// Deactivates every billing row of the organization and inserts `billing`
    /// as the single active row, atomically.
    async fn replace_active(&self, billing: &NewBilling) -> Result<Billing, DomainError>;
    async fn update_subscription(
        &self,
        id: i32,
        subscription_id: &str,
        product_id: &str,
    ) -> Result<(), DomainError>;
    async fn deactivate(&self, id: i32) -> Result<(), DomainError>;
}
