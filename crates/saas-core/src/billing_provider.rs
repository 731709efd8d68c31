// ============================================================================
// SaaS Core - Billing Provider Port
// File: crates/saas-core/src/billing_provider.rs
// ============================================================================
//! Port to the external payment processor.
//!
//! The provider's objects are reduced to the fields reconciliation reads.
//! Expandable references (customer, subscription, product) are flattened to
//! ids, with the product name carried alongside when the provider returned it.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::SubscriptionStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    #[error("Billing request failed: {0}")]
    Request(String),

    #[error("Billing provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected billing response: {0}")]
    Decode(String),

    #[error("Billing request rejected: {0}")]
    Rejected(String),
}

/// A completed hosted-checkout session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    /// The user id the checkout was started for.
    pub client_reference_id: Option<String>,
}

/// The price of a subscription's first item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub price_id: String,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    pub plan: Option<SubscriptionPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub price_id: String,
    /// Existing customer to reuse, if the organization already has one.
    pub customer_id: Option<String>,
    pub client_reference_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub trial_period_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub customer_id: String,
    pub product_id: String,
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub id: String,
    pub product_id: String,
    pub unit_amount: Option<i64>,
    pub currency: String,
    pub interval: Option<String>,
    pub trial_period_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub default_price_id: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Checkout session with customer and subscription expanded to ids.
    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, BillingError>;

    /// Subscription with its first item's price and product expanded.
    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<ProviderSubscription, BillingError>;

    async fn retrieve_product(&self, product_id: &str) -> Result<ProductSummary, BillingError>;

    /// Creates a subscription checkout session and returns its hosted URL.
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String, BillingError>;

    /// Creates a customer-portal session and returns its URL.
    async fn create_portal_session(&self, request: &PortalRequest) -> Result<String, BillingError>;

    /// Active recurring prices.
    async fn list_prices(&self) -> Result<Vec<PriceSummary>, BillingError>;

    /// Active products.
    async fn list_products(&self) -> Result<Vec<ProductSummary>, BillingError>;
}
