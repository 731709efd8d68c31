//! Stripe JSON shapes, reduced to the fields the port exposes

use serde::Deserialize;

use saas_core::billing_provider::{
    BillingError, CheckoutSession, PriceSummary, ProductSummary, ProviderSubscription,
    SubscriptionPlan,
};
use saas_core::domain::SubscriptionStatus;

/// A reference Stripe returns either as a bare id or, when expanded, as the object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Expandable<T> {
    Id(String),
    Object(T),
}

pub(crate) trait StripeObject {
    fn id(&self) -> &str;
}

impl<T: StripeObject> Expandable<T> {
    pub(crate) fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object(object) => object.id(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectRef {
    pub id: String,
}

impl StripeObject for ObjectRef {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct List<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UrlObject {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckoutSessionWire {
    pub id: String,
    pub customer: Option<Expandable<ObjectRef>>,
    pub subscription: Option<Expandable<ObjectRef>>,
    pub client_reference_id: Option<String>,
}

impl From<CheckoutSessionWire> for CheckoutSession {
    fn from(wire: CheckoutSessionWire) -> Self {
        CheckoutSession {
            customer_id: wire.customer.as_ref().map(|c| c.id().to_string()),
            subscription_id: wire.subscription.as_ref().map(|s| s.id().to_string()),
            client_reference_id: wire.client_reference_id,
            id: wire.id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductWire {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub default_price: Option<Expandable<ObjectRef>>,
}

fn default_true() -> bool {
    true
}

impl StripeObject for ProductWire {
    fn id(&self) -> &str {
        &self.id
    }
}

impl From<ProductWire> for ProductSummary {
    fn from(wire: ProductWire) -> Self {
        ProductSummary {
            default_price_id: wire.default_price.as_ref().map(|p| p.id().to_string()),
            id: wire.id,
            name: wire.name,
            description: wire.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecurringWire {
    pub interval: Option<String>,
    pub trial_period_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceWire {
    pub id: String,
    pub product: Expandable<ProductWire>,
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub currency: String,
    pub recurring: Option<RecurringWire>,
}

impl From<PriceWire> for PriceSummary {
    fn from(wire: PriceWire) -> Self {
        let (interval, trial_period_days) = match wire.recurring {
            Some(recurring) => (recurring.interval, recurring.trial_period_days),
            None => (None, None),
        };
        PriceSummary {
            product_id: wire.product.id().to_string(),
            id: wire.id,
            unit_amount: wire.unit_amount,
            currency: wire.currency,
            interval,
            trial_period_days,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionItemWire {
    pub price: PriceWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionWire {
    pub id: String,
    pub customer: Expandable<ObjectRef>,
    pub status: String,
    pub items: List<SubscriptionItemWire>,
}

impl TryFrom<SubscriptionWire> for ProviderSubscription {
    type Error = BillingError;

    fn try_from(wire: SubscriptionWire) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&wire.status).ok_or_else(|| {
            BillingError::Decode(format!("unknown subscription status '{}'", wire.status))
        })?;
        let plan = wire.items.data.into_iter().next().map(|item| {
            let product_id = item.price.product.id().to_string();
            let product_name = match item.price.product {
                Expandable::Object(product) => Some(product.name),
                Expandable::Id(_) => None,
            };
            SubscriptionPlan {
                price_id: item.price.id,
                product_id: Some(product_id),
                product_name,
            }
        });

        Ok(ProviderSubscription {
            customer_id: wire.customer.id().to_string(),
            id: wire.id,
            status,
            plan,
        })
    }
}
