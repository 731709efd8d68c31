// ============================================================================
// SaaS API - Action Validator
// File: crates/saas-api/src/actions/validator.rs
// ============================================================================
//! Form-action wrappers.
//!
//! A form body is decoded into a typed schema and validated before the
//! wrapped action runs. A failing schema short-circuits with the first error
//! message in field order; a missing user (for identity-bound actions) is an
//! `Err`, not a result value.

use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use thiserror::Error;
use tracing::debug;
use validator::{Validate, ValidationError, ValidationErrors};

use saas_core::domain::User;
use saas_core::error::DomainError;
use saas_core::services::SubscriptionError;

use crate::error::ApiError;
use crate::middleware::gate::append_cookie;

/// A form schema whose validation errors are reported in declaration order.
pub trait ActionSchema: DeserializeOwned + Validate {
    /// Field names in declaration order.
    const FIELDS: &'static [&'static str];

    /// Submitted form keys returned alongside a validation error.
    const ECHO: &'static [&'static str] = &[];
}

/// Result shape returned to the form: `{error?, success?, ...extra}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionState {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    State(ActionState),
    /// See-other redirect, optionally writing a cookie on the way.
    Redirect {
        location: String,
        set_cookie: Option<String>,
    },
}

impl ActionOutcome {
    pub fn redirect(location: impl Into<String>) -> Self {
        ActionOutcome::Redirect {
            location: location.into(),
            set_cookie: None,
        }
    }

    pub fn with_cookie(self, cookie: String) -> Self {
        match self {
            ActionOutcome::Redirect { location, .. } => ActionOutcome::Redirect {
                location,
                set_cookie: Some(cookie),
            },
            state => state,
        }
    }
}

impl From<ActionState> for ActionOutcome {
    fn from(state: ActionState) -> Self {
        ActionOutcome::State(state)
    }
}

impl IntoResponse for ActionOutcome {
    fn into_response(self) -> Response {
        match self {
            ActionOutcome::State(state) => Json(state).into_response(),
            ActionOutcome::Redirect { location, set_cookie } => {
                let mut response = Redirect::to(&location).into_response();
                if let Some(cookie) = set_cookie {
                    append_cookie(&mut response, &cookie);
                }
                response
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("User is not authenticated")]
    AuthenticationRequired,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let api_error = match self {
            ActionError::AuthenticationRequired => {
                ApiError::Unauthorized("User is not authenticated".to_string())
            }
            ActionError::Domain(e) => e.into(),
            ActionError::Subscription(e) => e.into(),
        };
        api_error.into_response()
    }
}

pub type ActionResult = Result<ActionOutcome, ActionError>;

/// Decodes and validates `body`, or returns the state to send back instead.
pub fn parse_form<S: ActionSchema>(body: &[u8]) -> Result<S, ActionState> {
    let data: S = serde_urlencoded::from_bytes(body).map_err(|e| {
        debug!("Undecodable form submission: {}", e);
        echo::<S>(ActionState::error(format!("Invalid form data: {}", e)), body)
    })?;

    data.validate()
        .map_err(|errors| echo::<S>(ActionState::error(first_message::<S>(&errors)), body))?;
    Ok(data)
}

/// The first error message, taking fields in `S::FIELDS` order and
/// struct-level errors last.
pub fn first_message<S: ActionSchema>(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    S::FIELDS
        .iter()
        .copied()
        .chain(std::iter::once("__all__"))
        .find_map(|field| field_errors.get(field).and_then(|errs| errs.first()))
        .or_else(|| field_errors.values().find_map(|errs| errs.first()))
        .map(message_of)
        .unwrap_or_else(|| "Invalid form submission".to_string())
}

fn message_of(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

fn echo<S: ActionSchema>(state: ActionState, body: &[u8]) -> ActionState {
    if S::ECHO.is_empty() {
        return state;
    }
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
    S::ECHO.iter().fold(state, |state, key| {
        match pairs.iter().find(|(k, _)| k.as_str() == *key) {
            Some((_, value)) => state.with(key, value.clone()),
            None => state,
        }
    })
}

/// Runs `action` on a valid submission.
pub async fn validated_action<S, F, Fut>(body: &[u8], action: F) -> ActionResult
where
    S: ActionSchema,
    F: FnOnce(S) -> Fut,
    Fut: Future<Output = ActionResult>,
{
    match parse_form::<S>(body) {
        Ok(data) => action(data).await,
        Err(state) => Ok(state.into()),
    }
}

/// Runs `action` for the signed-in `user` on a valid submission. The user is
/// checked before the form.
pub async fn validated_action_with_user<S, F, Fut>(user: Option<User>, body: &[u8], action: F) -> ActionResult
where
    S: ActionSchema,
    F: FnOnce(S, User) -> Fut,
    Fut: Future<Output = ActionResult>,
{
    let user = user.ok_or(ActionError::AuthenticationRequired)?;
    match parse_form::<S>(body) {
        Ok(data) => action(data, user).await,
        Err(state) => Ok(state.into()),
    }
}
