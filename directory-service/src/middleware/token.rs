//! Bearer token abstraction layer
//!
//! Provides the claims carried by issued tokens, the per-call authorization
//! context derived from them, and bearer header parsing shared by every
//! validator.

use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of the header carrying the bearer credential
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Issuer written into every token
pub const TOKEN_ISSUER: &str = "GrpcServer";

/// Audience written into every token
pub const TOKEN_AUDIENCE: &str = "GrpcClient";

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Whether the token is still inside its validity window at `now`
    pub fn is_live_at(&self, now: i64) -> bool {
        now <= self.exp
    }
}

/// Authorization attached to a call that passed the authentication layer
///
/// Holds validity only; no claims or roles are consumed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub valid: bool,
}

impl AuthorizationContext {
    /// Context for a verified, unexpired token
    pub fn verified() -> Self {
        Self { valid: true }
    }
}

/// Token validator trait
///
/// Abstracts token validation so the authentication layer can be exercised
/// with any verifier.
pub trait TokenValidator: Send + Sync + Clone + 'static {
    /// Validate a token and extract claims
    fn validate_token(&self, token: &str) -> Result<Claims, Error>;
}

/// Extract token from Authorization header (Bearer scheme)
pub fn extract_token(headers: &HeaderMap) -> Result<String, Error> {
    let auth_header = headers
        .get(AUTHORIZATION_HEADER)
        .ok_or_else(|| Error::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| Error::Unauthorized("Authorization header is not valid ASCII".to_string()))?;

    extract_bearer(auth_header)
}

/// Parse a `Bearer <token>` credential
///
/// The scheme name is case-insensitive.
pub fn extract_bearer(value: &str) -> Result<String, Error> {
    let (scheme, token) = value
        .trim_start()
        .split_once(' ')
        .ok_or_else(|| Error::Unauthorized("Invalid Authorization header format".to_string()))?;

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(Error::Unauthorized(
            "Invalid Authorization header format".to_string(),
        ));
    }

    let token = token.trim();

    if token.is_empty() {
        return Err(Error::Unauthorized("Empty bearer token".to_string()));
    }

    Ok(token.to_string())
}
