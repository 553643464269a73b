//! Middleware modules for bearer-token authentication

// Token abstraction layer
pub mod token;

// JWT validation
pub mod jwt;

pub use jwt::JwtAuth;
pub use token::{
    extract_bearer, extract_token, AuthorizationContext, Claims, TokenValidator,
    AUTHORIZATION_HEADER,
};
