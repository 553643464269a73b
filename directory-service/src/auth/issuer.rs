//! Bearer token issuance
//!
//! Mints the short-lived HS256 tokens handed out by `GET /jwt`.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use std::time::Duration;

use super::SigningKey;
use crate::error::Result;
use crate::middleware::token::{Claims, TOKEN_AUDIENCE, TOKEN_ISSUER};

/// Validity window of every issued token
///
/// Claims are whole Unix seconds, so the window has one-second granularity.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(60);

/// JWT token issuer
///
/// Stateless apart from the immutable key, so one instance is shared by all
/// concurrent requests.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: Arc<EncodingKey>,
}

impl TokenIssuer {
    /// Create an issuer signing with `key`
    pub fn new(key: &SigningKey) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(key.as_bytes())),
        }
    }

    /// Issue a token valid from now for [`TOKEN_LIFETIME`]
    pub fn issue(&self) -> Result<String> {
        self.issue_at(Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (Unix seconds)
    pub fn issue_at(&self, now: i64) -> Result<String> {
        let claims = Claims {
            iss: Some(TOKEN_ISSUER.to_string()),
            aud: Some(TOKEN_AUDIENCE.to_string()),
            iat: now,
            nbf: Some(now),
            exp: now + TOKEN_LIFETIME.as_secs() as i64,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }
}
