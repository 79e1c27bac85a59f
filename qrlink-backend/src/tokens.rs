//! Signed bearer tokens
//!
//! Issues and verifies the HS256 tokens handed out after a confirmed QR
//! login. Tokens are a pure function of the signing secret fixed at startup;
//! nothing is stored and expiry is the only invalidation mechanism.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token creation failed: {0}")]
    Creation(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Short window: minted fresh for every authenticated poll reply.
    pub fn issue_poll_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, Duration::minutes(30))
    }

    /// Extended window: returned directly to the confirming device.
    pub fn issue_confirm_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, Duration::hours(1))
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Creation(e.to_string()))
    }

    /// Returns the embedded subject. Fails on a bad signature, a malformed
    /// payload, or an elapsed expiry (no leeway, expiry is exact).
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}
