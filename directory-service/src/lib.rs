//! # directory-service
//!
//! A small user directory served over gRPC.
//!
//! - `ListUsers` returns every user in one response
//! - `StreamUsers` sends the same users one at a time, at least 100ms apart
//! - `GetUserById` returns one user and requires a bearer token
//! - `GET /jwt` issues that token (HS256, valid for 60 seconds)
//!
//! gRPC and the HTTP endpoint share one port.
//!
//! ## Example
//!
//! ```rust,no_run
//! use directory_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     DirectoryServer::new(config)?.serve().await
//! }
//! ```

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod grpc;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

/// Generated protobuf types and service stubs
pub mod proto {
    tonic::include_proto!("directory.v1");
}

pub mod prelude {
    pub use crate::auth::{SigningKey, TokenIssuer, TOKEN_LIFETIME};
    pub use crate::config::Config;
    pub use crate::directory::{DirectoryFixture, InMemoryDirectory, Role, UserRecord, UserSource};
    pub use crate::error::{Error, Result};
    pub use crate::grpc::{DirectoryService, GrpcAuthLayer, ProtectedMethods, RpcTracingLayer};
    pub use crate::middleware::{AuthorizationContext, Claims, JwtAuth, TokenValidator};
    pub use crate::observability::init_tracing;
    pub use crate::server::DirectoryServer;
}
