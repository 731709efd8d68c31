//! Read endpoints behind the protected prefix

use axum::{extract::State, Json};
use serde::Serialize;

use saas_core::domain::{ActivityLog, TeamWithMembers, User};

use crate::error::ApiError;
use crate::extract::{CurrentUser, RequestLocale};
use crate::middleware::locale::Locale;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: User,
    pub team: Option<TeamWithMembers>,
    pub locale: String,
}

/// `GET /dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DashboardView>, ApiError> {
    let team = state.teams.team_for_user(user.id).await?;
    let locale = locale
        .map(|Locale(locale)| locale)
        .unwrap_or_else(|| state.locales.default_locale().to_string());

    Ok(Json(DashboardView { user, team, locale }))
}

/// `GET /dashboard/activity`
pub async fn activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    Ok(Json(state.teams.recent_activity(user.id).await?))
}
