//! Team management form actions

use axum::extract::{RawForm, State};

use saas_core::domain::User;
use saas_core::error::DomainError;

use crate::actions::forms::{InviteMemberForm, RemoveMemberForm};
use crate::actions::{validated_action_with_user, ActionResult, ActionState};
use crate::extract::{ClientIp, MaybeUser};
use crate::state::AppState;

pub async fn remove_member(
    State(state): State<AppState>,
    ip: ClientIp,
    MaybeUser(user): MaybeUser,
    RawForm(body): RawForm,
) -> ActionResult {
    validated_action_with_user(user, &body, |form, user| remove_member_action(&state, form, user, ip)).await
}

async fn remove_member_action(
    state: &AppState,
    form: RemoveMemberForm,
    user: User,
    ip: ClientIp,
) -> ActionResult {
    match state.teams.remove_member(&user, form.member_id, ip.as_deref()).await {
        Ok(()) => Ok(ActionState::success("Team member removed successfully").into()),
        Err(DomainError::TeamNotFound) => Ok(ActionState::error("User is not part of a team").into()),
        Err(e) => Err(e.into()),
    }
}

pub async fn invite_member(
    State(state): State<AppState>,
    ip: ClientIp,
    MaybeUser(user): MaybeUser,
    RawForm(body): RawForm,
) -> ActionResult {
    validated_action_with_user(user, &body, |form, user| invite_member_action(&state, form, user, ip)).await
}

async fn invite_member_action(
    state: &AppState,
    form: InviteMemberForm,
    user: User,
    ip: ClientIp,
) -> ActionResult {
    match state
        .teams
        .invite_member(&user, &form.email, form.team_role(), ip.as_deref())
        .await
    {
        Ok(_) => Ok(ActionState::success("Invitation sent successfully.").into()),
        Err(DomainError::TeamNotFound) => Ok(ActionState::error("Team not found").into()),
        Err(e) => Err(e.into()),
    }
}
