// ============================================================================
// SaaS Core - Billing Service
// File: crates/saas-core/src/services/billing_service.rs
// ============================================================================
//! Subscription reconciliation and provider-hosted checkout/portal flows
//!
//! Two paths write billing state:
//! - the checkout callback, which links a completed checkout session to the
//!   purchasing user's organization and replaces its active billing row;
//! - subscription-change events, which update or deactivate the active row
//!   found by customer id.
//!
//! Both mirror the plan name and status onto the organization's team.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use saas_security::session::IssuedSession;
use saas_security::SessionManager;
use saas_shared::constants::BILLING_PROVIDER_STRIPE;
use saas_shared::utils::join_url;

use crate::billing_provider::{
    BillingError, BillingProvider, CheckoutRequest, PortalRequest, PriceSummary, ProductSummary,
    ProviderSubscription, SubscriptionPlan,
};
use crate::domain::NewBilling;
use crate::error::DomainError;
use crate::repositories::Repositories;

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("Checkout session has no customer")]
    MissingCustomer,

    #[error("No subscription found for this session")]
    MissingSubscription,

    #[error("No plan found for this subscription")]
    MissingPlan,

    #[error("No product found for this subscription")]
    MissingProduct,

    #[error("Checkout session carries no user reference")]
    MissingUserReference,

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("User {0} is not associated with any team")]
    MembershipNotFound(i32),

    #[error("No active billing for customer {0}")]
    UnknownCustomer(String),

    #[error(transparent)]
    Provider(#[from] BillingError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// URLs and defaults used when creating provider sessions.
#[derive(Debug, Clone)]
pub struct BillingLinks {
    pub base_url: String,
    pub trial_period_days: u32,
}

impl BillingLinks {
    fn checkout_success_url(&self) -> String {
        join_url(&self.base_url, "/api/stripe/checkout?session_id={CHECKOUT_SESSION_ID}")
    }

    fn pricing_url(&self) -> String {
        join_url(&self.base_url, "/pricing")
    }

    fn dashboard_url(&self) -> String {
        join_url(&self.base_url, "/dashboard")
    }
}

pub struct BillingService {
    repos: Repositories,
    provider: Arc<dyn BillingProvider>,
    sessions: Arc<SessionManager>,
    links: BillingLinks,
}

impl BillingService {
    pub fn new(
        repos: Repositories,
        provider: Arc<dyn BillingProvider>,
        sessions: Arc<SessionManager>,
        links: BillingLinks,
    ) -> Self {
        Self {
            repos,
            provider,
            sessions,
            links,
        }
    }

    /// Applies a completed checkout session and re-issues the purchaser's session.
    ///
    /// The organization's previous active billing row is deactivated and the new
    /// one inserted in a single transaction.
    pub async fn reconcile_checkout(&self, session_id: &str) -> Result<IssuedSession, SubscriptionError> {
        let checkout = self.provider.retrieve_checkout_session(session_id).await?;

        let customer_id = checkout.customer_id.ok_or(SubscriptionError::MissingCustomer)?;
        let subscription_id = checkout
            .subscription_id
            .ok_or(SubscriptionError::MissingSubscription)?;
        let subscription = self.provider.retrieve_subscription(&subscription_id).await?;
        let plan = subscription.plan.as_ref().ok_or(SubscriptionError::MissingPlan)?;
        let product_id = plan
            .product_id
            .clone()
            .ok_or(SubscriptionError::MissingProduct)?;
        let user_id: i32 = checkout
            .client_reference_id
            .as_deref()
            .and_then(|reference| reference.parse().ok())
            .ok_or(SubscriptionError::MissingUserReference)?;

        let user = self
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(SubscriptionError::UserNotFound(user_id))?;
        let membership = self
            .repos
            .teams
            .find_membership(user.id)
            .await?
            .ok_or(SubscriptionError::MembershipNotFound(user.id))?;
        let plan_name = self.plan_name(plan, &product_id).await?;

        let billing = self
            .repos
            .billings
            .replace_active(&NewBilling {
                organization_id: membership.organization_id,
                provider: BILLING_PROVIDER_STRIPE.to_string(),
                customer_id,
                subscription_id: subscription.id.clone(),
                product_id,
            })
            .await?;
        self.repos
            .teams
            .update_subscription(
                membership.team_id,
                Some(&plan_name),
                Some(subscription.status.as_str()),
            )
            .await?;

        let session = self
            .sessions
            .set_session(user.id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        info!(
            "Checkout {} linked: organization {} now on '{}' (billing {})",
            session_id, membership.organization_id, plan_name, billing.id
        );
        Ok(session)
    }

    /// Webhook path. Failures, including an unknown customer, are logged and dropped.
    pub async fn handle_subscription_change(&self, subscription: &ProviderSubscription) {
        if let Err(e) = self.apply_subscription_change(subscription).await {
            error!(
                "Subscription {} change for customer {} not applied: {}",
                subscription.id, subscription.customer_id, e
            );
        }
    }

    pub async fn apply_subscription_change(
        &self,
        subscription: &ProviderSubscription,
    ) -> Result<(), SubscriptionError> {
        let link = self
            .repos
            .billings
            .find_active_by_customer(&subscription.customer_id)
            .await?
            .ok_or_else(|| SubscriptionError::UnknownCustomer(subscription.customer_id.clone()))?;
        let status = subscription.status;

        if status.is_live() {
            let plan = subscription.plan.as_ref().ok_or(SubscriptionError::MissingPlan)?;
            let product_id = plan
                .product_id
                .as_deref()
                .ok_or(SubscriptionError::MissingProduct)?;
            let plan_name = self.plan_name(plan, product_id).await?;

            tokio::try_join!(
                self.repos
                    .billings
                    .update_subscription(link.billing.id, &subscription.id, product_id),
                self.repos
                    .teams
                    .update_subscription(link.team_id, Some(&plan_name), Some(status.as_str())),
            )?;
            info!("Team {} subscription is {} on '{}'", link.team_id, status.as_str(), plan_name);
        } else if status.is_terminal() {
            tokio::try_join!(
                self.repos.billings.deactivate(link.billing.id),
                self.repos
                    .teams
                    .update_subscription(link.team_id, None, Some(status.as_str())),
            )?;
            warn!("Team {} subscription ended: {}", link.team_id, status.as_str());
        } else {
            debug!(
                "Ignoring subscription {} in status {}",
                subscription.id,
                status.as_str()
            );
        }
        Ok(())
    }

    /// The organization reached through the user's team.
    pub async fn organization_for_user(&self, user_id: i32) -> Result<Option<i32>, DomainError> {
        Ok(self
            .repos
            .teams
            .find_membership(user_id)
            .await?
            .map(|m| m.organization_id))
    }

    /// Starts a subscription checkout for `price_id`, reusing the organization's
    /// provider customer when it has one. Returns the hosted checkout URL.
    pub async fn start_checkout(
        &self,
        organization_id: i32,
        user_id: i32,
        price_id: &str,
    ) -> Result<String, SubscriptionError> {
        let active = self
            .repos
            .billings
            .find_active_by_organization(organization_id)
            .await?;

        let request = CheckoutRequest {
            price_id: price_id.to_string(),
            customer_id: active.and_then(|billing| billing.customer_id),
            client_reference_id: user_id.to_string(),
            success_url: self.links.checkout_success_url(),
            cancel_url: self.links.pricing_url(),
            trial_period_days: self.links.trial_period_days,
        };
        let url = self.provider.create_checkout_session(&request).await?;
        info!("Checkout started for organization {} on price {}", organization_id, price_id);
        Ok(url)
    }

    /// Customer-portal URL, or `None` when the organization has no active
    /// billing with both a customer and a product.
    pub async fn open_portal(&self, organization_id: i32) -> Result<Option<String>, SubscriptionError> {
        let Some(billing) = self
            .repos
            .billings
            .find_active_by_organization(organization_id)
            .await?
        else {
            return Ok(None);
        };
        let (Some(customer_id), Some(product_id)) = (billing.customer_id, billing.product_id) else {
            return Ok(None);
        };

        let url = self
            .provider
            .create_portal_session(&PortalRequest {
                customer_id,
                product_id,
                return_url: self.links.dashboard_url(),
            })
            .await?;
        Ok(Some(url))
    }

    pub async fn prices(&self) -> Result<Vec<PriceSummary>, BillingError> {
        self.provider.list_prices().await
    }

    pub async fn products(&self) -> Result<Vec<ProductSummary>, BillingError> {
        self.provider.list_products().await
    }

    async fn plan_name(&self, plan: &SubscriptionPlan, product_id: &str) -> Result<String, BillingError> {
        match &plan.product_name {
            Some(name) => Ok(name.clone()),
            None => Ok(self.provider.retrieve_product(product_id).await?.name),
        }
    }
}
