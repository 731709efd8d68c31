//! Session token codec (HS256 JWT)
//!
//! A token carries a [`SessionPayload`] plus the numeric `exp` claim derived
//! from `payload.expires`. Verification rejects altered tokens with
//! [`TokenError::InvalidSignature`] and stale ones with [`TokenError::Expired`].

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionPayload;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
    #[error("Token creation failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    payload: SessionPayload,
    exp: i64,
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    window: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, window: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Builds a fresh payload for `user_id` expiring one window after `now`.
    ///
    /// Timestamps are kept at millisecond precision so that the ISO string
    /// inside the token round-trips exactly.
    pub fn issue(&self, user_id: i32, now: DateTime<Utc>) -> SessionPayload {
        SessionPayload {
            user_id,
            expires: now.trunc_subsecs(3) + self.window,
        }
    }

    pub fn sign(&self, payload: &SessionPayload) -> Result<String, TokenError> {
        let claims = Claims {
            payload: payload.clone(),
            exp: payload.expires.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionPayload, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            }
        })?;

        let payload = data.claims.payload;
        // `exp` has second granularity; the ISO timestamp is authoritative.
        if payload.expires <= Utc::now() {
            return Err(TokenError::Expired);
        }
        Ok(payload)
    }

    /// Verifies `token` and re-signs it with `expires = now + window`.
    pub fn renew(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(SessionPayload, String), TokenError> {
        let current = self.verify(token)?;
        let renewed = self.issue(current.user_id, now);
        let token = self.sign(&renewed)?;
        Ok((renewed, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::hours(24))
    }

    #[test]
    fn test_sign_and_verify() {
        let codec = codec();
        let payload = codec.issue(42, Utc::now());
        let token = codec.sign(&payload).unwrap();

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified, payload);
        assert_eq!(verified.user_id, 42);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let payload = SessionPayload {
            user_id: 7,
            expires: Utc::now() - Duration::hours(1),
        };
        let token = codec.sign(&payload).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_checked_below_one_second() {
        let codec = codec();
        let payload = SessionPayload {
            user_id: 7,
            expires: Utc::now().trunc_subsecs(3) - Duration::milliseconds(1),
        };
        let token = codec.sign(&payload).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let now = Utc::now();
        let mine = codec.sign(&codec.issue(1, now)).unwrap();
        let theirs = codec.sign(&codec.issue(2, now)).unwrap();

        // Graft the other user's payload onto this token's signature.
        let mine_parts: Vec<&str> = mine.split('.').collect();
        let theirs_parts: Vec<&str> = theirs.split('.').collect();
        let forged = format!("{}.{}.{}", mine_parts[0], theirs_parts[1], mine_parts[2]);

        assert_eq!(codec.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = TokenCodec::new("another-secret-another-secret-xx", Duration::hours(24));
        let token = other.sign(&other.issue(1, Utc::now())).unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let stale = SessionPayload {
            user_id: 1,
            expires: Utc::now() - Duration::hours(1),
        };
        let other = TokenCodec::new("another-secret-another-secret-xx", Duration::hours(24));
        let forged = other.sign(&stale).unwrap();
        let genuine = codec().sign(&stale).unwrap();

        assert_eq!(codec().verify(&forged), Err(TokenError::InvalidSignature));
        assert_eq!(codec().verify(&genuine), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_is_invalid_signature() {
        assert_eq!(codec().verify("not-a-token"), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_renew_slides_expiry_by_window() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::hours(3);
        let original = codec.issue(9, issued_at);
        let token = codec.sign(&original).unwrap();

        let now = Utc::now();
        let (renewed, new_token) = codec.renew(&token, now).unwrap();
        let reverified = codec.verify(&new_token).unwrap();

        assert_eq!(reverified, renewed);
        assert_eq!(reverified.expires, now.trunc_subsecs(3) + codec.window());
        assert!(reverified.expires > original.expires);
    }

    #[test]
    fn test_renew_rejects_expired() {
        let codec = codec();
        let stale = SessionPayload {
            user_id: 3,
            expires: Utc::now() - Duration::minutes(5),
        };
        let token = codec.sign(&stale).unwrap();

        assert_eq!(codec.renew(&token, Utc::now()).unwrap_err(), TokenError::Expired);
    }
}
