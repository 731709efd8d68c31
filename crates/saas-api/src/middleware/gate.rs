// ============================================================================
// SaaS API - Request Gate
// File: crates/saas-api/src/middleware/gate.rs
// ============================================================================
//! Session gate run in front of routing.
//!
//! Every page request is classified against the protected prefix and the
//! public routes. A valid session cookie is re-signed with a fresh expiry on
//! the way out (sliding window); an invalid one is deleted. Locale
//! negotiation runs afterwards regardless of the session outcome.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::{debug, warn};

use saas_shared::config::RouteSettings;

use crate::extract::cookie_header;
use crate::middleware::locale::{Locale, LocaleAction};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session.
    Protected,
    /// Explicitly public pages such as sign-in.
    Public,
    /// Neither; served with or without a session.
    Open,
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    protected_prefix: String,
    public_routes: Vec<String>,
    sign_in_path: String,
}

impl RoutePolicy {
    pub fn from_settings(settings: &RouteSettings) -> Self {
        Self {
            protected_prefix: settings.protected_prefix.clone(),
            public_routes: settings.public_routes.clone(),
            sign_in_path: settings.sign_in_path.clone(),
        }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if path.starts_with(&self.protected_prefix) {
            RouteClass::Protected
        } else if self.public_routes.iter().any(|route| path.contains(route.as_str())) {
            RouteClass::Public
        } else {
            RouteClass::Open
        }
    }

    /// API routes, health checks and static files skip the gate.
    pub fn bypasses(path: &str) -> bool {
        let is_under = |prefix: &str| {
            path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
        };
        is_under("/api") || is_under("/health") || path.contains('.')
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }
}

pub async fn request_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if RoutePolicy::bypasses(&path) {
        return next.run(request).await;
    }

    let route = state.routes.classify(state.locales.strip_prefix(&path));
    let token = cookie_header(request.headers())
        .and_then(|header| state.sessions.cookie().read(header));

    let session_cookie = match token {
        None if route == RouteClass::Protected => {
            debug!("No session for protected path {}", path);
            return Redirect::temporary(state.routes.sign_in_path()).into_response();
        }
        None => None,
        Some(token) => match state.sessions.renew(&token, Utc::now()) {
            Ok(issued) => Some(issued.set_cookie),
            Err(e) => {
                warn!("Error updating session on {}: {}", path, e);
                let cleared = state.sessions.clear_cookie();
                if route == RouteClass::Protected {
                    let mut response = Redirect::temporary(state.routes.sign_in_path()).into_response();
                    append_cookie(&mut response, &cleared);
                    return response;
                }
                Some(cleared)
            }
        },
    };

    let decision = {
        let headers = request.headers();
        state.locales.decide(
            &path,
            request.uri().query(),
            cookie_header(headers),
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        )
    };
    let locale_cookie = decision
        .explicit
        .then(|| state.locales.cookie(&decision.locale));

    let mut response = match decision.action {
        LocaleAction::Redirect(location) => Redirect::temporary(&location).into_response(),
        LocaleAction::Rewrite(target) => {
            match target.parse::<Uri>() {
                Ok(uri) => *request.uri_mut() = uri,
                Err(e) => warn!("Cannot rewrite {} to {}: {}", path, target, e),
            }
            request.extensions_mut().insert(Locale(decision.locale));
            next.run(request).await
        }
        LocaleAction::Continue => {
            request.extensions_mut().insert(Locale(decision.locale));
            next.run(request).await
        }
    };

    if let Some(cookie) = session_cookie {
        // A handler that wrote the session cookie itself (sign-in, sign-out) wins.
        if !sets_cookie(&response, &state.sessions.cookie().name) {
            append_cookie(&mut response, &cookie);
        }
    }
    if let Some(cookie) = locale_cookie {
        append_cookie(&mut response, &cookie);
    }
    response
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

pub(crate) fn append_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Dropping unencodable Set-Cookie value: {}", e),
    }
}
