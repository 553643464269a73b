//! JWT validation against the process signing key

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

use super::token::{Claims, TokenValidator, TOKEN_AUDIENCE, TOKEN_ISSUER};
use crate::{auth::SigningKey, config::AuthConfig, error::Error};

/// HS256 bearer token validator
///
/// Verifies the signature and that `now <= exp`, with no leeway. Issuer and
/// audience are only checked when enabled in [`AuthConfig`]; by default a
/// token with any (or no) `iss`/`aud` is accepted.
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl JwtAuth {
    /// Create a validator with issuer and audience checks disabled
    pub fn new(key: &SigningKey) -> Self {
        Self::with_config(key, &AuthConfig::default())
    }

    /// Create a validator honouring the issuer/audience flags
    pub fn with_config(key: &SigningKey, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked in `validate_at` so callers can pin the clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        validation.validate_aud = config.validate_audience;
        if config.validate_audience {
            validation.set_audience(&[TOKEN_AUDIENCE]);
        }
        if config.validate_issuer {
            validation.set_issuer(&[TOKEN_ISSUER]);
        }

        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(key.as_bytes())),
            validation,
        }
    }

    /// Validate a token as of `now` (Unix seconds)
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = token_data.claims;

        if !claims.is_live_at(now) {
            return Err(Error::Unauthorized("Token has expired".to_string()));
        }

        Ok(claims)
    }
}

impl TokenValidator for JwtAuth {
    fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        self.validate_at(token, Utc::now().timestamp())
    }
}
