//! Shared router-test fixtures: in-memory repositories and a scripted billing provider
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use saas_api::{build_router, AppState};
use saas_core::billing_provider::{
    BillingError, BillingProvider, CheckoutRequest, CheckoutSession, PortalRequest, PriceSummary,
    ProductSummary, ProviderSubscription, SubscriptionPlan,
};
use saas_core::domain::SubscriptionStatus;
use saas_core::repositories::{MemoryStore, Repositories};
use saas_shared::config::AppConfig;

pub const SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const CHECKOUT_URL: &str = "https://checkout.stripe.test/c/pay_1";
pub const PORTAL_URL: &str = "https://billing.stripe.test/p/session_1";

#[derive(Default)]
pub struct FakeBillingProvider {
    pub checkout_session: Mutex<Option<CheckoutSession>>,
    pub subscription: Mutex<Option<ProviderSubscription>>,
    pub checkout_requests: Mutex<Vec<CheckoutRequest>>,
    pub portal_requests: Mutex<Vec<PortalRequest>>,
}

impl FakeBillingProvider {
    /// Scripts a completed checkout for `user_id` on an active "Base" subscription.
    pub fn complete_checkout(&self, user_id: i32) {
        *self.checkout_session.lock() = Some(CheckoutSession {
            id: "cs_1".into(),
            customer_id: Some("cus_1".into()),
            subscription_id: Some("sub_1".into()),
            client_reference_id: Some(user_id.to_string()),
        });
        *self.subscription.lock() = Some(ProviderSubscription {
            id: "sub_1".into(),
            customer_id: "cus_1".into(),
            status: SubscriptionStatus::Active,
            plan: Some(SubscriptionPlan {
                price_id: "price_1".into(),
                product_id: Some("prod_1".into()),
                product_name: Some("Base".into()),
            }),
        });
    }
}

#[async_trait]
impl BillingProvider for FakeBillingProvider {
    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, BillingError> {
        self.checkout_session.lock().clone().ok_or_else(|| BillingError::Api {
            status: 404,
            message: format!("No such checkout.session: '{}'", session_id),
        })
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<ProviderSubscription, BillingError> {
        self.subscription.lock().clone().ok_or_else(|| BillingError::Api {
            status: 404,
            message: format!("No such subscription: '{}'", subscription_id),
        })
    }

    async fn retrieve_product(&self, product_id: &str) -> Result<ProductSummary, BillingError> {
        Ok(ProductSummary {
            id: product_id.to_string(),
            name: "Plus".into(),
            description: None,
            default_price_id: None,
        })
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String, BillingError> {
        self.checkout_requests.lock().push(request.clone());
        Ok(CHECKOUT_URL.into())
    }

    async fn create_portal_session(&self, request: &PortalRequest) -> Result<String, BillingError> {
        self.portal_requests.lock().push(request.clone());
        Ok(PORTAL_URL.into())
    }

    async fn list_prices(&self) -> Result<Vec<PriceSummary>, BillingError> {
        Ok(vec![PriceSummary {
            id: "price_1".into(),
            product_id: "prod_1".into(),
            unit_amount: Some(800),
            currency: "usd".into(),
            interval: Some("month".into()),
            trial_period_days: Some(14),
        }])
    }

    async fn list_products(&self) -> Result<Vec<ProductSummary>, BillingError> {
        Ok(vec![ProductSummary {
            id: "prod_1".into(),
            name: "Base".into(),
            description: Some("Everything to get started".into()),
            default_price_id: Some("price_1".into()),
        }])
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeBillingProvider>,
}

pub fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.secret = SECRET.into();
    config.billing.webhook_secret = WEBHOOK_SECRET.into();
    config
}

pub fn app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(FakeBillingProvider::default());
    let state = AppState::new(config(), Repositories::in_memory(store.clone()), provider.clone());

    TestApp {
        router: build_router(state),
        store,
        provider,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_form(&self, path: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Signs up `email` with a personal team and returns the `session=...` pair.
    pub async fn sign_up(&self, email: &str) -> String {
        let body = format!(
            "email={}&password=password123&firstName=Ada&lastName=Lovelace",
            email.replace('@', "%40")
        );
        let response = self.post_form("/sign-up", &body, None).await;
        assert_eq!(response.status(), 303);
        session_cookie(&response).expect("sign-up sets the session cookie")
    }

    pub async fn dashboard(&self, cookie: &str) -> Value {
        let response = self.get("/dashboard", Some(cookie)).await;
        assert_eq!(response.status(), 200);
        json(response).await
    }
}

/// The `session=<token>` pair from a response that issues a session.
pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with("session=") && !c.starts_with("session=;"))
        .and_then(|c| c.split(';').next().map(str::to_string))
}

pub fn set_cookies<B>(response: &Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub fn location<B>(response: &Response<B>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

pub async fn json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
