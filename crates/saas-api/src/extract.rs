//! Request extractors for the caller's identity and address

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;

use saas_core::domain::User;

use crate::error::ApiError;
use crate::middleware::locale::Locale;
use crate::state::AppState;

/// Raw `Cookie` header, if any.
pub fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
}

/// Client address from `x-forwarded-for` (first hop) or `x-real-ip`.
#[derive(Debug, Clone, Default)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim);
        let real_ip = parts
            .headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim);

        Ok(ClientIp(
            forwarded
                .or(real_ip)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string),
        ))
    }
}

/// The signed-in user, or `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = state.auth.current_user(cookie_header(&parts.headers)).await?;
        Ok(MaybeUser(user))
    }
}

/// The signed-in user; rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("User is not authenticated".into()))
    }
}

/// Locale chosen by the request gate; `None` on routes the gate skips.
#[derive(Debug, Clone)]
pub struct RequestLocale(pub Option<Locale>);

impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestLocale(parts.extensions.get::<Locale>().cloned()))
    }
}
