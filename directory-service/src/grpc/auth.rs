//! Authentication boundary for gRPC calls
//!
//! [`GrpcAuthLayer`] sits in front of RPC dispatch and checks the bearer
//! token of every call whose method path is listed in [`ProtectedMethods`].
//! Rejected calls are answered with `Unauthenticated` without ever reaching
//! the handler; accepted calls carry an [`AuthorizationContext`] in their
//! request extensions. Unlisted paths pass through untouched.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::Error;
use crate::middleware::token::{extract_token, AuthorizationContext, TokenValidator};

/// Set of fully-qualified method paths that require a bearer token
///
/// Paths take the form `/package.Service/Method`.
#[derive(Debug, Clone, Default)]
pub struct ProtectedMethods {
    paths: Arc<HashSet<String>>,
}

impl ProtectedMethods {
    /// Protect exactly the given method paths
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            paths: Arc::new(paths.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether calls to `path` must be authenticated
    pub fn requires_auth(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Number of protected methods
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no method is protected
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Layer that authenticates protected gRPC methods
#[derive(Clone)]
pub struct GrpcAuthLayer<V> {
    validator: V,
    protected: ProtectedMethods,
}

impl<V: TokenValidator> GrpcAuthLayer<V> {
    /// Create the layer
    pub fn new(validator: V, protected: ProtectedMethods) -> Self {
        Self {
            validator,
            protected,
        }
    }
}

impl<S, V: Clone> Layer<S> for GrpcAuthLayer<V> {
    type Service = GrpcAuthService<S, V>;

    fn layer(&self, inner: S) -> Self::Service {
        GrpcAuthService {
            inner,
            validator: self.validator.clone(),
            protected: self.protected.clone(),
        }
    }
}

/// Authentication service implementation
#[derive(Clone)]
pub struct GrpcAuthService<S, V> {
    inner: S,
    validator: V,
    protected: ProtectedMethods,
}

impl<S, V: TokenValidator> GrpcAuthService<S, V> {
    fn authenticate(&self, headers: &http::HeaderMap) -> Result<AuthorizationContext, Error> {
        let token = extract_token(headers)?;
        self.validator.validate_token(&token)?;
        Ok(AuthorizationContext::verified())
    }
}

impl<S, V, ReqBody, ResBody> Service<http::Request<ReqBody>> for GrpcAuthService<S, V>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    V: TokenValidator,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if !self.protected.requires_auth(req.uri().path()) {
            return Box::pin(inner.call(req));
        }

        match self.authenticate(req.headers()) {
            Ok(context) => {
                req.extensions_mut().insert(context);
                Box::pin(inner.call(req))
            }
            Err(err) => {
                tracing::warn!(
                    rpc.path = %req.uri().path(),
                    reason = %err,
                    "Rejected unauthenticated gRPC call"
                );
                let status = tonic::Status::from(err);
                Box::pin(async move { Ok(status.into_http()) })
            }
        }
    }
}
