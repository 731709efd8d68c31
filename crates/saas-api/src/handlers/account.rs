//! Account settings form actions

use axum::extract::{RawForm, State};

use saas_core::domain::User;
use saas_core::error::DomainError;

use crate::actions::forms::{DeleteAccountForm, UpdateAccountForm, UpdatePasswordForm};
use crate::actions::{validated_action_with_user, ActionOutcome, ActionResult, ActionState};
use crate::extract::{ClientIp, MaybeUser};
use crate::state::AppState;

pub async fn update_password(
    State(state): State<AppState>,
    ip: ClientIp,
    MaybeUser(user): MaybeUser,
    RawForm(body): RawForm,
) -> ActionResult {
    validated_action_with_user(user, &body, |form, user| update_password_action(&state, form, user, ip)).await
}

async fn update_password_action(
    state: &AppState,
    form: UpdatePasswordForm,
    user: User,
    ip: ClientIp,
) -> ActionResult {
    let result = state
        .account
        .update_password(&user, &form.current_password, &form.new_password, ip.as_deref())
        .await;

    let outcome = match result {
        Ok(()) => ActionState::success("Password updated successfully."),
        Err(DomainError::InvalidCredentials) => ActionState::error("Current password is incorrect."),
        Err(DomainError::PasswordUnchanged) => {
            ActionState::error("New password must be different from the current password.")
        }
        Err(e) => return Err(e.into()),
    };
    Ok(outcome.into())
}

pub async fn delete_account(
    State(state): State<AppState>,
    ip: ClientIp,
    MaybeUser(user): MaybeUser,
    RawForm(body): RawForm,
) -> ActionResult {
    validated_action_with_user(user, &body, |form, user| delete_account_action(&state, form, user, ip)).await
}

async fn delete_account_action(
    state: &AppState,
    form: DeleteAccountForm,
    user: User,
    ip: ClientIp,
) -> ActionResult {
    match state.account.delete_account(&user, &form.password, ip.as_deref()).await {
        Ok(cleared) => {
            Ok(ActionOutcome::redirect(state.config.routes.sign_in_path.clone()).with_cookie(cleared))
        }
        Err(DomainError::InvalidCredentials) => {
            Ok(ActionState::error("Incorrect password. Account deletion failed.").into())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update_account(
    State(state): State<AppState>,
    ip: ClientIp,
    MaybeUser(user): MaybeUser,
    RawForm(body): RawForm,
) -> ActionResult {
    validated_action_with_user(user, &body, |form, user| update_account_action(&state, form, user, ip)).await
}

async fn update_account_action(
    state: &AppState,
    form: UpdateAccountForm,
    user: User,
    ip: ClientIp,
) -> ActionResult {
    match state
        .account
        .update_account(&user, &form.name, &form.email, ip.as_deref())
        .await
    {
        Ok(updated) => Ok(ActionState::success("Account updated successfully.")
            .with("name", updated.name.unwrap_or_default())
            .into()),
        Err(DomainError::EmailAlreadyExists(_)) => Ok(ActionState::error("Email is already in use.")
            .with("name", form.name)
            .with("email", form.email)
            .into()),
        Err(e) => Err(e.into()),
    }
}
