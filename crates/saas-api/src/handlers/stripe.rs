// ============================================================================
// SaaS API - Stripe Handlers
// File: crates/saas-api/src/handlers/stripe.rs
// ============================================================================
//! Checkout callback, webhook receiver and pricing catalogue

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use saas_core::billing_provider::{PriceSummary, ProductSummary};
use saas_infrastructure::billing::WebhookError;
use saas_infrastructure::WebhookEvent;

use crate::error::ApiError;
use crate::middleware::gate::append_cookie;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
pub struct CheckoutCallback {
    pub session_id: Option<String>,
}

/// `GET /api/stripe/checkout?session_id=...`
pub async fn checkout_callback(
    State(state): State<AppState>,
    Query(query): Query<CheckoutCallback>,
) -> Response {
    let routes = &state.config.routes;
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return Redirect::temporary(&routes.pricing_path).into_response();
    };

    match state.billing.reconcile_checkout(&session_id).await {
        Ok(session) => {
            let mut response = Redirect::temporary(&routes.dashboard_path).into_response();
            append_cookie(&mut response, &session.set_cookie);
            response
        }
        Err(e) => {
            error!("Error handling successful checkout {}: {}", session_id, e);
            Redirect::temporary(&routes.error_path).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// `POST /api/stripe/webhook`
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe-Signature header".into()))?;

    let event = state.webhooks.construct_event(&body, signature).map_err(|e| match e {
        WebhookError::InvalidPayload(reason) => {
            warn!("Undecodable webhook payload: {}", reason);
            ApiError::BadRequest("Invalid webhook payload.".into())
        }
        other => {
            warn!("Webhook signature verification failed: {}", other);
            ApiError::BadRequest("Webhook signature verification failed.".into())
        }
    })?;

    match event {
        WebhookEvent::SubscriptionChanged(subscription) => {
            info!("Subscription {} changed to {}", subscription.id, subscription.status.as_str());
            state.billing.handle_subscription_change(&subscription).await;
        }
        WebhookEvent::Ignored(event_type) => {
            info!("Unhandled webhook event type {}", event_type);
        }
    }
    Ok(Json(WebhookAck { received: true }))
}

/// `GET /api/stripe/prices`
pub async fn prices(State(state): State<AppState>) -> Result<Json<Vec<PriceSummary>>, ApiError> {
    Ok(Json(state.billing.prices().await?))
}

/// `GET /api/stripe/products`
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<ProductSummary>>, ApiError> {
    Ok(Json(state.billing.products().await?))
}
