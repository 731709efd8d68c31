// ============================================================================
// SaaS API - Auth Handlers
// File: crates/saas-api/src/handlers/auth.rs
// ============================================================================
//! Sign-in, sign-up and sign-out form actions

use axum::extract::{RawForm, State};
use tracing::{debug, warn};

use saas_core::error::DomainError;
use saas_core::services::{AuthenticatedUser, SignUpRequest};

use crate::actions::forms::{checkout_price, SignInForm, SignUpForm};
use crate::actions::{validated_action, ActionOutcome, ActionResult, ActionState};
use crate::extract::{ClientIp, MaybeUser};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";
const SIGN_UP_FAILED: &str = "Failed to create user. Please try again.";
const INVALID_INVITATION: &str = "Invalid or expired invitation.";

pub async fn sign_in(State(state): State<AppState>, ip: ClientIp, RawForm(body): RawForm) -> ActionResult {
    validated_action(&body, |form| sign_in_action(&state, form, ip)).await
}

async fn sign_in_action(state: &AppState, form: SignInForm, ip: ClientIp) -> ActionResult {
    let authenticated = match state.auth.sign_in(&form.email, &form.password, ip.as_deref()).await {
        Ok(authenticated) => authenticated,
        Err(DomainError::InvalidCredentials) => {
            return Ok(ActionState::error(INVALID_CREDENTIALS)
                .with("email", form.email)
                .into());
        }
        Err(e) => return Err(e.into()),
    };

    let price = checkout_price(form.redirect.as_deref(), form.price_id.as_deref());
    after_authentication(state, authenticated, price).await
}

pub async fn sign_up(State(state): State<AppState>, ip: ClientIp, RawForm(body): RawForm) -> ActionResult {
    validated_action(&body, |form| sign_up_action(&state, form, ip)).await
}

async fn sign_up_action(state: &AppState, form: SignUpForm, ip: ClientIp) -> ActionResult {
    let Ok(invite_id) = form.invitation() else {
        debug!("Rejecting non-numeric invitation id {:?}", form.invite_id);
        return Ok(ActionState::error(INVALID_INVITATION).with("email", form.email).into());
    };

    let request = SignUpRequest {
        email: form.email.clone(),
        password: form.password.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        invite_id,
    };
    let authenticated = match state.auth.sign_up(&request, ip.as_deref()).await {
        Ok(authenticated) => authenticated,
        Err(e) => {
            let message = match e {
                DomainError::EmailAlreadyExists(_) => SIGN_UP_FAILED.to_string(),
                DomainError::InvitationUnavailable => INVALID_INVITATION.to_string(),
                DomainError::UnableToGenerateUniqueSubdomain => SIGN_UP_FAILED.to_string(),
                DomainError::ValidationError(message) => message,
                other => return Err(other.into()),
            };
            return Ok(ActionState::error(message).with("email", form.email).into());
        }
    };

    let price = checkout_price(form.redirect.as_deref(), form.price_id.as_deref());
    after_authentication(state, authenticated, price).await
}

/// Sends a freshly signed-in user to checkout when they arrived from the
/// pricing page, otherwise to the dashboard.
async fn after_authentication(
    state: &AppState,
    authenticated: AuthenticatedUser,
    price: Option<String>,
) -> ActionResult {
    let session_cookie = authenticated.session.set_cookie;
    let location = match (price, authenticated.organization_id) {
        (Some(price_id), Some(organization_id)) => {
            state
                .billing
                .start_checkout(organization_id, authenticated.user.id, &price_id)
                .await?
        }
        _ => state.config.routes.dashboard_path.clone(),
    };
    Ok(ActionOutcome::redirect(location).with_cookie(session_cookie))
}

pub async fn sign_out(State(state): State<AppState>, ip: ClientIp, MaybeUser(user): MaybeUser) -> ActionResult {
    let cleared = match user {
        Some(user) => state.auth.sign_out(user.id, ip.as_deref()).await?,
        None => {
            warn!("Sign-out without a session");
            state.sessions.clear_cookie()
        }
    };
    Ok(ActionOutcome::redirect(state.config.routes.sign_in_path.clone()).with_cookie(cleared))
}
