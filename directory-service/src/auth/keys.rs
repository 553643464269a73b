//! HMAC signing key shared by the token issuer and validator

use rand::Rng;
use std::fmt;
use std::sync::Arc;

use crate::config::{AuthConfig, MIN_SIGNING_KEY_BYTES};
use crate::error::Result;

/// Symmetric key used to sign and verify bearer tokens
///
/// Immutable after construction and cheap to clone. Tokens signed with one
/// key never verify against another, so tokens do not survive a restart
/// unless the key is supplied through configuration.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Arc<[u8]>,
}

impl SigningKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut bytes = [0u8; MIN_SIGNING_KEY_BYTES];
        rand::rng().fill(&mut bytes);
        Self {
            bytes: Arc::from(bytes.as_slice()),
        }
    }

    /// Wrap existing key material
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Use the configured key, or generate one when none is configured
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match config.signing_key_bytes()? {
            Some(bytes) => {
                tracing::info!("Using signing key from configuration");
                Ok(Self::from_bytes(bytes))
            }
            None => {
                tracing::info!("Generated ephemeral signing key; tokens expire with this process");
                Ok(Self::generate())
            }
        }
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
