//! Token issuance and key material
//!
//! [`TokenIssuer`] mints tokens; validation lives in
//! [`crate::middleware::JwtAuth`]. Both are built from the same
//! [`SigningKey`].

pub mod issuer;
pub mod keys;

pub use issuer::{TokenIssuer, TOKEN_LIFETIME};
pub use keys::SigningKey;
