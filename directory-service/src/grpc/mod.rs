//! gRPC surface of the directory
//!
//! - [`service`]: the `UserDirectory` implementation
//! - [`auth`]: bearer-token check in front of protected methods
//! - [`middleware`]: request id and tracing for every call
//! - [`server`]: transport settings
//!
//! Layers are applied on the tonic server so they see the raw method path:
//!
//! ```ignore
//! GrpcServer::new(config.grpc.clone())
//!     .builder()
//!     .layer(RpcTracingLayer)
//!     .layer(GrpcAuthLayer::new(jwt_auth, protected_methods()))
//!     .add_routes(routes)
//!     .serve(addr)
//!     .await?;
//! ```

pub mod auth;
pub mod middleware;
pub mod server;
pub mod service;

pub use auth::{GrpcAuthLayer, GrpcAuthService, ProtectedMethods};
pub use middleware::{RequestId, RpcTracingLayer, RpcTracingService, REQUEST_ID_HEADER};
pub use server::{protected_methods, GrpcServer};
pub use service::{DirectoryService, UserSummaryStream, GET_USER_BY_ID_PATH};

// Re-export tonic types for convenience
pub use tonic::{Code, Request, Response, Status};
