//! Session payload and cookie handling
//!
//! Session state lives entirely in the client-held `session` cookie; there is
//! no server-side session table. The cookie value is a token produced by
//! [`TokenCodec`].

use chrono::{DateTime, Duration, Utc};
use cookie::time::{self, OffsetDateTime};
use cookie::{Cookie, CookieBuilder, SameSite};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::token::{TokenCodec, TokenError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub expires: DateTime<Utc>,
}

/// Cookie attributes for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self { name: name.into(), secure }
    }

    /// `Set-Cookie` value storing `token` until `expires`.
    pub fn build(&self, token: &str, expires: DateTime<Utc>) -> String {
        let expires = OffsetDateTime::from_unix_timestamp(expires.timestamp()).ok();
        self.builder(token).expires(expires).build().to_string()
    }

    /// `Set-Cookie` value that deletes the cookie.
    pub fn clear(&self) -> String {
        self.builder("")
            .max_age(time::Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
            .to_string()
    }

    /// Extracts this cookie's value from a `Cookie` request header.
    ///
    /// Surrounding double quotes are stripped; malformed pairs are skipped.
    pub fn read(&self, cookie_header: &str) -> Option<String> {
        Cookie::split_parse(cookie_header)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.name)
            .map(|cookie| cookie.value_trimmed().to_string())
            .filter(|value| !value.is_empty())
    }

    fn builder<'c>(&'c self, value: &'c str) -> CookieBuilder<'c> {
        Cookie::build((self.name.as_str(), value))
            .path("/")
            .secure(self.secure)
            .http_only(true)
            .same_site(SameSite::Lax)
    }
}

/// Result of issuing or renewing a session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub payload: SessionPayload,
    pub set_cookie: String,
}

pub struct SessionManager {
    codec: TokenCodec,
    cookie: SessionCookie,
}

impl SessionManager {
    pub fn new(secret: &str, ttl: Duration, cookie: SessionCookie) -> Self {
        Self {
            codec: TokenCodec::new(secret, ttl),
            cookie,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    /// Signs `{userId, expires: now + ttl}` and returns the cookie to set.
    pub fn set_session(&self, user_id: i32) -> Result<IssuedSession, TokenError> {
        let payload = self.codec.issue(user_id, Utc::now());
        let token = self.codec.sign(&payload)?;
        Ok(IssuedSession {
            set_cookie: self.cookie.build(&token, payload.expires),
            payload,
        })
    }

    /// Reads and verifies the session from a `Cookie` header.
    ///
    /// Absent and invalid sessions are indistinguishable to the caller.
    pub fn get_session(&self, cookie_header: Option<&str>) -> Option<SessionPayload> {
        let value = cookie_header.and_then(|h| self.cookie.read(h))?;
        match self.codec.verify(&value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!("Ignoring session cookie: {}", e);
                None
            }
        }
    }

    /// Sliding renewal: verify `token` and reissue it one full window after `now`.
    pub fn renew(&self, token: &str, now: DateTime<Utc>) -> Result<IssuedSession, TokenError> {
        let (payload, token) = self.codec.renew(token, now)?;
        Ok(IssuedSession {
            set_cookie: self.cookie.build(&token, payload.expires),
            payload,
        })
    }

    pub fn clear_cookie(&self) -> String {
        self.cookie.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(
            "0123456789abcdef0123456789abcdef",
            Duration::hours(24),
            SessionCookie::new("session", true),
        )
    }

    fn cookie_value(set_cookie: &str) -> &str {
        let first = set_cookie.split(';').next().unwrap();
        first.strip_prefix("session=").unwrap()
    }

    #[test]
    fn test_set_session_cookie_attributes() {
        let issued = manager().set_session(5).unwrap();
        assert!(issued.set_cookie.starts_with("session="));
        assert!(issued.set_cookie.contains("; Path=/"));
        assert!(issued.set_cookie.contains("; Secure"));
        assert!(issued.set_cookie.contains("; HttpOnly"));
        assert!(issued.set_cookie.contains("; SameSite=Lax"));
        assert!(issued.set_cookie.contains("GMT"));
    }

    #[test]
    fn test_payload_serializes_as_user_id_and_iso_expiry() {
        let payload = SessionPayload {
            user_id: 3,
            expires: "2030-01-01T00:00:00.000Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["userId"], 3);
        assert!(json["expires"].as_str().unwrap().starts_with("2030-01-01T00:00:00"));
    }

    #[test]
    fn test_get_session_roundtrip() {
        let manager = manager();
        let issued = manager.set_session(11).unwrap();
        let header = format!("theme=dark; session={}; other=1", cookie_value(&issued.set_cookie));

        let payload = manager.get_session(Some(&header)).unwrap();
        assert_eq!(payload.user_id, 11);
    }

    #[test]
    fn test_absent_and_invalid_are_both_anonymous() {
        let manager = manager();
        assert!(manager.get_session(None).is_none());
        assert!(manager.get_session(Some("theme=dark")).is_none());
        assert!(manager.get_session(Some("session=")).is_none());
        assert!(manager.get_session(Some("session=garbage")).is_none());
    }

    #[test]
    fn test_quoted_session_value_is_unwrapped() {
        let manager = manager();
        let issued = manager.set_session(12).unwrap();
        let header = format!("session=\"{}\"", cookie_value(&issued.set_cookie));

        assert_eq!(
            manager.cookie().read(&header).as_deref(),
            Some(cookie_value(&issued.set_cookie))
        );
        assert_eq!(manager.get_session(Some(&header)).unwrap().user_id, 12);
    }

    #[test]
    fn test_read_skips_malformed_pairs() {
        let cookie = SessionCookie::new("session", true);
        assert_eq!(cookie.read("=orphan; session=abc").as_deref(), Some("abc"));
        assert_eq!(cookie.read("sessionx=abc"), None);
    }

    #[test]
    fn test_clear_cookie() {
        let cleared = manager().clear_cookie();
        assert!(cleared.starts_with("session=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.contains("; Path=/"));
        assert!(cleared.contains("; HttpOnly"));
        assert!(cleared.contains("Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn test_insecure_cookie_for_local_dev() {
        let cookie = SessionCookie::new("session", false);
        assert!(!cookie.build("t", Utc::now()).contains("Secure"));
    }
}
