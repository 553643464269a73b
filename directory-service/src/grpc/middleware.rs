//! gRPC middleware utilities
//!
//! Provides Tower middleware that wraps every call served by the directory
//! server: request id propagation plus a tracing span and completion log.

use http::HeaderValue;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id attached to request extensions by [`RpcTracingLayer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Tracing middleware layer
///
/// Reuses an incoming `x-request-id` or generates one, opens a span per
/// call and echoes the id on the response.
#[derive(Debug, Clone, Default)]
pub struct RpcTracingLayer;

impl<S> Layer<S> for RpcTracingLayer {
    type Service = RpcTracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcTracingService { inner }
    }
}

/// Tracing service implementation
#[derive(Debug, Clone)]
pub struct RpcTracingService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for RpcTracingService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            req.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        req.extensions_mut().insert(RequestId(request_id.clone()));

        let path = req.uri().path().to_string();
        let is_grpc = is_grpc_request(&req);

        let span = if is_grpc {
            tracing::info_span!(
                "grpc_request",
                otel.kind = "server",
                rpc.system = "grpc",
                rpc.service = %extract_service_name(&path),
                rpc.method = %extract_method_name(&path),
                request_id = %request_id,
            )
        } else {
            tracing::info_span!(
                "http_request",
                http.method = %req.method(),
                http.path = %path,
                request_id = %request_id,
            )
        };

        Box::pin(
            async move {
                let start = Instant::now();
                tracing::debug!(path = %path, "Request started");

                let result = inner.call(req).await;
                let duration = start.elapsed();

                match result {
                    Ok(mut response) => {
                        // Trailers-only responses (e.g. rejected calls) carry the
                        // status in the headers; streamed results carry it in trailers.
                        let grpc_status = response
                            .headers()
                            .get("grpc-status")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or(if is_grpc { "trailers" } else { "-" })
                            .to_string();

                        tracing::info!(
                            duration_ms = duration.as_millis(),
                            http.status = response.status().as_u16(),
                            grpc.status_code = %grpc_status,
                            "Request completed"
                        );

                        if let Ok(value) = HeaderValue::from_str(&request_id) {
                            response.headers_mut().insert(REQUEST_ID_HEADER, value);
                        }
                        Ok(response)
                    }
                    Err(err) => {
                        tracing::warn!(
                            duration_ms = duration.as_millis(),
                            error.message = %err,
                            "Request failed"
                        );
                        Err(err)
                    }
                }
            }
            .instrument(span),
        )
    }
}

fn is_grpc_request<B>(req: &http::Request<B>) -> bool {
    req.headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/grpc"))
        .unwrap_or(false)
}

/// Extract service name from gRPC method path
///
/// gRPC method paths are in the format: /package.Service/Method
fn extract_service_name(path: &str) -> &str {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .and_then(|s| s.rsplit('.').next())
        .unwrap_or("unknown")
}

/// Extract method name from gRPC method path
fn extract_method_name(path: &str) -> &str {
    path.trim_start_matches('/')
        .split('/')
        .nth(1)
        .unwrap_or("unknown")
}
