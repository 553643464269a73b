//! Directory server: gRPC and the token endpoint on one port, with graceful shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;

use crate::{
    auth::{SigningKey, TokenIssuer},
    config::Config,
    directory::{DirectoryFixture, InMemoryDirectory},
    error::Result,
    grpc::{protected_methods, DirectoryService, GrpcAuthLayer, GrpcServer, RpcTracingLayer},
    handlers,
    middleware::JwtAuth,
};

/// Server instance
///
/// Owns everything shared by in-flight calls: the signing key (through the
/// issuer and validator) and the directory contents.
pub struct DirectoryServer {
    config: Config,
    issuer: TokenIssuer,
    validator: JwtAuth,
    directory: Arc<InMemoryDirectory>,
}

impl DirectoryServer {
    /// Build the key material and directory from configuration
    pub fn new(config: Config) -> Result<Self> {
        let key = SigningKey::from_config(&config.auth)?;
        let seed = config.directory.seed.unwrap_or_else(rand::random);
        let directory = DirectoryFixture::new(config.directory.size, seed).into_directory();

        tracing::info!(
            users = directory.len(),
            seed,
            "Generated user directory"
        );

        Ok(Self {
            issuer: TokenIssuer::new(&key),
            validator: JwtAuth::with_config(&key, &config.auth),
            directory: Arc::new(directory),
            config,
        })
    }

    /// Directory served by this instance
    pub fn directory(&self) -> Arc<InMemoryDirectory> {
        Arc::clone(&self.directory)
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve_with_listener(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `signal` resolves
    pub async fn serve_with_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_config();

        let grpc = GrpcServer::new(self.config.grpc.clone());
        let service = DirectoryService::new(self.directory, self.config.stream.interval());

        let routes = Routes::from(handlers::router(self.issuer))
            .add_service(grpc.directory_service(service));

        grpc.builder()
            .layer(RpcTracingLayer)
            .layer(GrpcAuthLayer::new(self.validator, protected_methods()))
            .add_routes(routes)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn log_config(&self) {
        tracing::info!("  - gRPC timeout: {} seconds", self.config.grpc.timeout_secs);
        tracing::info!(
            "  - Stream interval: {} ms",
            self.config.stream.interval().as_millis()
        );
        tracing::info!(
            "  - Token issuer/audience checks: {}/{}",
            self.config.auth.validate_issuer,
            self.config.auth.validate_audience
        );
    }
}

/// Wait for SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_configured_size_and_seed() {
        let mut config = Config::default();
        config.directory.size = 4;
        config.directory.seed = Some(9);

        let server = DirectoryServer::new(config).unwrap();
        assert_eq!(server.directory().len(), 4);

        let again = DirectoryServer::new({
            let mut config = Config::default();
            config.directory.size = 4;
            config.directory.seed = Some(9);
            config
        })
        .unwrap();
        assert_eq!(
            format!("{:?}", server.directory()),
            format!("{:?}", again.directory())
        );
    }

    #[test]
    fn test_new_rejects_bad_signing_key() {
        let mut config = Config::default();
        config.auth.signing_key = Some("zz".to_string());
        assert!(DirectoryServer::new(config).is_err());
    }
}
