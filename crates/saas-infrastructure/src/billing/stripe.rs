// ============================================================================
// SaaS Infrastructure - Stripe Billing Client
// File: crates/saas-infrastructure/src/billing/stripe.rs
// ============================================================================
//! Stripe REST client implementing the billing-provider port.
//!
//! Requests are form-encoded with Stripe's bracket syntax for nested fields
//! (`line_items[0][price]`), responses are read through the shapes in
//! [`super::wire`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

use saas_core::billing_provider::{
    BillingError, BillingProvider, CheckoutRequest, CheckoutSession, PortalRequest, PriceSummary,
    ProductSummary, ProviderSubscription,
};

use super::wire::{
    CheckoutSessionWire, ErrorEnvelope, List, ObjectRef, PriceWire, ProductWire, SubscriptionWire,
    UrlObject,
};

pub const STRIPE_API_VERSION: &str = "2024-06-20";

const CANCELLATION_REASONS: [&str; 5] = [
    "too_expensive",
    "missing_features",
    "switched_service",
    "unused",
    "other",
];

type Form = Vec<(String, String)>;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Result<Self, BillingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BillingError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, BillingError> {
        let mut url = Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| BillingError::Request(format!("invalid url for {}: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, BillingError> {
        let url = self.url(path, query)?;
        debug!("Stripe GET {}", path);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .send()
            .await
            .map_err(|e| BillingError::Request(e.to_string()))?;

        Self::read(path, response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, form: &Form) -> Result<T, BillingError> {
        let url = self.url(path, &[])?;
        let body = serde_urlencoded::to_string(form).map_err(|e| BillingError::Request(e.to_string()))?;
        debug!("Stripe POST {}", path);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| BillingError::Request(e.to_string()))?;

        Self::read(path, response).await
    }

    async fn read<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, BillingError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BillingError::Request(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or(body);
            error!("Stripe {} failed ({}): {}", path, status, message);
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Stripe {} returned an unexpected body: {}", path, e);
            BillingError::Decode(e.to_string())
        })
    }

    /// First existing portal configuration, or a new one allowing plan changes
    /// between the product's active prices.
    async fn portal_configuration(&self, product_id: &str) -> Result<String, BillingError> {
        let existing: List<ObjectRef> = self.get("/v1/billing_portal/configurations", &[]).await?;
        if let Some(configuration) = existing.data.into_iter().next() {
            return Ok(configuration.id);
        }

        let product: ProductWire = self.get(&format!("/v1/products/{}", product_id), &[]).await?;
        if !product.active {
            return Err(BillingError::Rejected(format!("product {} is not active", product.id)));
        }

        let prices: List<PriceWire> = self
            .get("/v1/prices", &[("product", product.id.as_str()), ("active", "true")])
            .await?;
        if prices.data.is_empty() {
            return Err(BillingError::Rejected(format!(
                "no active prices for product {}",
                product.id
            )));
        }

        let configuration: ObjectRef = self
            .post(
                "/v1/billing_portal/configurations",
                &portal_configuration_form(&product.id, &prices.data),
            )
            .await?;
        info!("Created billing portal configuration {}", configuration.id);
        Ok(configuration.id)
    }
}

fn pair(key: impl Into<String>, value: impl Into<String>) -> (String, String) {
    (key.into(), value.into())
}

fn checkout_form(request: &CheckoutRequest) -> Form {
    let mut form = vec![
        pair("payment_method_types[]", "card"),
        pair("line_items[0][price]", request.price_id.as_str()),
        pair("line_items[0][quantity]", "1"),
        pair("mode", "subscription"),
        pair("success_url", request.success_url.as_str()),
        pair("cancel_url", request.cancel_url.as_str()),
        pair("client_reference_id", request.client_reference_id.as_str()),
        pair("allow_promotion_codes", "true"),
        pair(
            "subscription_data[trial_period_days]",
            request.trial_period_days.to_string(),
        ),
    ];
    if let Some(customer_id) = &request.customer_id {
        form.push(pair("customer", customer_id.as_str()));
    }
    form
}

fn portal_configuration_form(product_id: &str, prices: &[PriceWire]) -> Form {
    let mut form = vec![
        pair("business_profile[headline]", "Manage your subscription"),
        pair("features[subscription_update][enabled]", "true"),
        pair("features[subscription_update][default_allowed_updates][]", "price"),
        pair("features[subscription_update][default_allowed_updates][]", "quantity"),
        pair("features[subscription_update][default_allowed_updates][]", "promotion_code"),
        pair("features[subscription_update][proration_behavior]", "create_prorations"),
        pair("features[subscription_update][products][0][product]", product_id),
        pair("features[subscription_cancel][enabled]", "true"),
        pair("features[subscription_cancel][mode]", "at_period_end"),
        pair("features[subscription_cancel][cancellation_reason][enabled]", "true"),
    ];
    for price in prices {
        form.push(pair(
            "features[subscription_update][products][0][prices][]",
            price.id.as_str(),
        ));
    }
    for reason in CANCELLATION_REASONS {
        form.push(pair(
            "features[subscription_cancel][cancellation_reason][options][]",
            reason,
        ));
    }
    form
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, BillingError> {
        let wire: CheckoutSessionWire = self
            .get(
                &format!("/v1/checkout/sessions/{}", session_id),
                &[("expand[]", "customer"), ("expand[]", "subscription")],
            )
            .await?;
        Ok(wire.into())
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<ProviderSubscription, BillingError> {
        let wire: SubscriptionWire = self
            .get(
                &format!("/v1/subscriptions/{}", subscription_id),
                &[("expand[]", "items.data.price.product")],
            )
            .await?;
        wire.try_into()
    }

    async fn retrieve_product(&self, product_id: &str) -> Result<ProductSummary, BillingError> {
        let wire: ProductWire = self.get(&format!("/v1/products/{}", product_id), &[]).await?;
        Ok(wire.into())
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String, BillingError> {
        let session: UrlObject = self.post("/v1/checkout/sessions", &checkout_form(request)).await?;
        session
            .url
            .ok_or_else(|| BillingError::Decode("checkout session has no url".into()))
    }

    async fn create_portal_session(&self, request: &PortalRequest) -> Result<String, BillingError> {
        let configuration = self.portal_configuration(&request.product_id).await?;
        let form = vec![
            pair("customer", request.customer_id.as_str()),
            pair("return_url", request.return_url.as_str()),
            pair("configuration", configuration),
        ];
        let session: UrlObject = self.post("/v1/billing_portal/sessions", &form).await?;
        session
            .url
            .ok_or_else(|| BillingError::Decode("portal session has no url".into()))
    }

    async fn list_prices(&self) -> Result<Vec<PriceSummary>, BillingError> {
        let prices: List<PriceWire> = self
            .get(
                "/v1/prices",
                &[
                    ("expand[]", "data.product"),
                    ("active", "true"),
                    ("type", "recurring"),
                ],
            )
            .await?;
        Ok(prices.data.into_iter().map(Into::into).collect())
    }

    async fn list_products(&self) -> Result<Vec<ProductSummary>, BillingError> {
        let products: List<ProductWire> = self
            .get(
                "/v1/products",
                &[("active", "true"), ("expand[]", "data.default_price")],
            )
            .await?;
        Ok(products.data.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> StripeClient {
        StripeClient::new("sk_test_123", server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_checkout_session_flattens_expansions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_1"))
            .and(query_param("expand[]", "subscription"))
            .and(header("authorization", "Bearer sk_test_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_1",
                "customer": {"id": "cus_1", "object": "customer"},
                "subscription": {"id": "sub_1", "object": "subscription"},
                "client_reference_id": "42"
            })))
            .mount(&server)
            .await;

        let session = client(&server).await.retrieve_checkout_session("cs_1").await.unwrap();
        assert_eq!(session.customer_id.as_deref(), Some("cus_1"));
        assert_eq!(session.subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(session.client_reference_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_checkout_session_without_subscription() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_2",
                "customer": "cus_1",
                "subscription": null,
                "client_reference_id": null
            })))
            .mount(&server)
            .await;

        let session = client(&server).await.retrieve_checkout_session("cs_2").await.unwrap();
        assert_eq!(session.customer_id.as_deref(), Some("cus_1"));
        assert!(session.subscription_id.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_subscription_reads_plan() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/subscriptions/sub_1"))
            .and(query_param("expand[]", "items.data.price.product"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "sub_1",
                "customer": "cus_1",
                "status": "active",
                "items": {"data": [{"price": {
                    "id": "price_1",
                    "currency": "usd",
                    "unit_amount": 800,
                    "product": {"id": "prod_1", "name": "Base", "active": true}
                }}]}
            })))
            .mount(&server)
            .await;

        let subscription = client(&server).await.retrieve_subscription("sub_1").await.unwrap();
        let plan = subscription.plan.unwrap();
        assert_eq!(plan.price_id, "price_1");
        assert_eq!(plan.product_name.as_deref(), Some("Base"));
    }

    #[tokio::test]
    async fn test_create_checkout_session_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("mode=subscription"))
            .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_1"))
            .and(body_string_contains("subscription_data%5Btrial_period_days%5D=14"))
            .and(body_string_contains("customer=cus_1"))
            .and(body_string_contains("client_reference_id=7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "cs_1", "url": "https://checkout.stripe.com/c/cs_1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server)
            .await
            .create_checkout_session(&CheckoutRequest {
                price_id: "price_1".into(),
                customer_id: Some("cus_1".into()),
                client_reference_id: "7".into(),
                success_url: "http://localhost:3000/api/stripe/checkout?session_id={CHECKOUT_SESSION_ID}".into(),
                cancel_url: "http://localhost:3000/pricing".into(),
                trial_period_days: 14,
            })
            .await
            .unwrap();
        assert_eq!(url, "https://checkout.stripe.com/c/cs_1");
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/products/prod_missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"message": "No such product: 'prod_missing'", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.retrieve_product("prod_missing").await.unwrap_err();
        assert_eq!(
            err,
            BillingError::Api {
                status: 404,
                message: "No such product: 'prod_missing'".into()
            }
        );
    }

    #[tokio::test]
    async fn test_portal_creates_configuration_when_none_exist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/billing_portal/configurations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/products/prod_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "prod_1", "name": "Base", "active": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/prices"))
            .and(query_param("product", "prod_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
                {"id": "price_1", "product": "prod_1", "currency": "usd"},
                {"id": "price_2", "product": "prod_1", "currency": "usd"}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/billing_portal/configurations"))
            .and(body_string_contains("price_2"))
            .and(body_string_contains("at_period_end"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "bpc_1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/billing_portal/sessions"))
            .and(body_string_contains("configuration=bpc_1"))
            .and(body_string_contains("customer=cus_1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"url": "https://billing.stripe.com/p/1"})),
            )
            .mount(&server)
            .await;

        let url = client(&server)
            .await
            .create_portal_session(&PortalRequest {
                customer_id: "cus_1".into(),
                product_id: "prod_1".into(),
                return_url: "http://localhost:3000/dashboard".into(),
            })
            .await
            .unwrap();
        assert_eq!(url, "https://billing.stripe.com/p/1");
    }

    #[tokio::test]
    async fn test_list_prices_maps_recurring_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/prices"))
            .and(query_param("type", "recurring"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{
                "id": "price_1",
                "product": {"id": "prod_1", "name": "Base"},
                "unit_amount": 800,
                "currency": "usd",
                "recurring": {"interval": "month", "trial_period_days": 7}
            }]})))
            .mount(&server)
            .await;

        let prices = client(&server).await.list_prices().await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].product_id, "prod_1");
        assert_eq!(prices[0].interval.as_deref(), Some("month"));
        assert_eq!(prices[0].trial_period_days, Some(7));
    }
}
