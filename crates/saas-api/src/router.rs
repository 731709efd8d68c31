//! Route table

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::Layer;
use tower_http::trace::TraceLayer;

use crate::handlers::{account, auth, billing, dashboard, health, stripe, team};
use crate::middleware::request_gate;
use crate::state::AppState;

/// Builds the application router.
///
/// The request gate wraps the whole route table rather than individual
/// routes, so a locale-prefix rewrite is visible to routing.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health_check))
        // Form actions
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-out", post(auth::sign_out))
        .route("/account", post(account::update_account))
        .route("/account/password", post(account::update_password))
        .route("/account/delete", post(account::delete_account))
        .route("/team/members/remove", post(team::remove_member))
        .route("/team/invitations", post(team::invite_member))
        .route("/billing/checkout", post(billing::checkout))
        .route("/billing/portal", post(billing::customer_portal))
        // Dashboard
        .route("/dashboard", get(dashboard::dashboard))
        .route("/dashboard/activity", get(dashboard::activity))
        // Stripe
        .route("/api/stripe/checkout", get(stripe::checkout_callback))
        .route("/api/stripe/webhook", post(stripe::webhook))
        .route("/api/stripe/prices", get(stripe::prices))
        .route("/api/stripe/products", get(stripe::products))
        .with_state(state.clone());

    let gated = middleware::from_fn_with_state(state, request_gate).layer(routes);

    Router::new()
        .fallback_service(gated)
        .layer(TraceLayer::new_for_http())
}
