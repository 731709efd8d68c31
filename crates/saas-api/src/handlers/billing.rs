//! Organization-scoped billing actions: hosted checkout and customer portal

use axum::{
    extract::State,
    response::Redirect,
    Form,
};
use std::future::Future;
use tracing::debug;

use saas_core::domain::User;

use crate::actions::forms::CheckoutForm;
use crate::error::ApiError;
use crate::extract::MaybeUser;
use crate::state::AppState;

/// Runs `action` for the caller's organization. Anonymous callers are sent to
/// sign-in and callers without a team to the pricing page.
async fn with_organization<F, Fut>(state: &AppState, user: Option<User>, action: F) -> Result<Redirect, ApiError>
where
    F: FnOnce(i32, User) -> Fut,
    Fut: Future<Output = Result<Redirect, ApiError>>,
{
    let Some(user) = user else {
        return Ok(Redirect::to(&state.config.routes.sign_in_path));
    };
    match state.billing.organization_for_user(user.id).await? {
        Some(organization_id) => action(organization_id, user).await,
        None => {
            debug!("User {} has no organization", user.id);
            Ok(Redirect::to(&state.config.routes.pricing_path))
        }
    }
}

pub async fn checkout(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect, ApiError> {
    with_organization(&state, user, |organization_id, user| {
        start_checkout(&state, organization_id, user, form.price_id)
    })
    .await
}

async fn start_checkout(
    state: &AppState,
    organization_id: i32,
    user: User,
    price_id: String,
) -> Result<Redirect, ApiError> {
    if price_id.trim().is_empty() {
        return Err(ApiError::BadRequest("priceId is required".into()));
    }
    let url = state
        .billing
        .start_checkout(organization_id, user.id, price_id.trim())
        .await?;
    Ok(Redirect::to(&url))
}

pub async fn customer_portal(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Redirect, ApiError> {
    with_organization(&state, user, |organization_id, _| open_portal(&state, organization_id)).await
}

async fn open_portal(state: &AppState, organization_id: i32) -> Result<Redirect, ApiError> {
    match state.billing.open_portal(organization_id).await? {
        Some(url) => Ok(Redirect::to(&url)),
        None => Ok(Redirect::to(&state.config.routes.pricing_path)),
    }
}
