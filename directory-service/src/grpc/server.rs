//! gRPC server construction

use std::time::Duration;
use tonic::transport::Server;

use crate::config::GrpcConfig;
use crate::directory::UserSource;
use crate::grpc::service::{DirectoryService, GET_USER_BY_ID_PATH};
use crate::grpc::ProtectedMethods;
use crate::proto::user_directory_server::UserDirectoryServer;

const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// gRPC server builder
///
/// Applies transport settings from [`GrpcConfig`]. HTTP/1 is accepted so the
/// token endpoint can share the listener with gRPC.
#[derive(Debug, Clone)]
pub struct GrpcServer {
    config: GrpcConfig,
}

impl GrpcServer {
    /// Create a new gRPC server with the given configuration
    pub fn new(config: GrpcConfig) -> Self {
        Self { config }
    }

    /// Base tonic server with frame size, timeout and keepalive applied
    pub fn builder(&self) -> Server {
        Server::builder()
            .accept_http1(true)
            .max_frame_size(Some(self.frame_size()))
            .timeout(self.config.timeout())
            .tcp_keepalive(Some(TCP_KEEPALIVE))
    }

    /// Wrap a directory service with the configured message limits
    pub fn directory_service<S: UserSource>(
        &self,
        service: DirectoryService<S>,
    ) -> UserDirectoryServer<DirectoryService<S>> {
        let limit = self.config.max_message_size_bytes();
        UserDirectoryServer::new(service)
            .max_decoding_message_size(limit)
            .max_encoding_message_size(limit)
    }

    // HTTP/2 caps frames at 2^24 - 1 bytes
    fn frame_size(&self) -> u32 {
        self.config
            .max_message_size_bytes()
            .min((1 << 24) - 1) as u32
    }
}

/// Methods that require a bearer token
pub fn protected_methods() -> ProtectedMethods {
    ProtectedMethods::new([GET_USER_BY_ID_PATH])
}
