//! Plain HTTP endpoints served next to gRPC
//!
//! `GET /jwt` hands out a fresh bearer token as `text/plain`. `GET /` returns
//! a short hint for anyone who points a browser at the port.

use axum::{extract::State, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::auth::TokenIssuer;
use crate::error::Result;

/// Text served on `GET /`
pub const SERVICE_INFO: &str = "Communication with gRPC endpoints must be made through a gRPC client. \
Request a bearer token from GET /jwt before calling GetUserById.";

/// Router for the HTTP side channel
pub fn router(issuer: TokenIssuer) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/jwt", get(issue_token))
        .layer(TraceLayer::new_for_http())
        .with_state(issuer)
}

/// `GET /jwt`
pub async fn issue_token(State(issuer): State<TokenIssuer>) -> Result<String> {
    let token = issuer.issue()?;
    tracing::debug!("Issued bearer token");
    Ok(token)
}

/// `GET /`
pub async fn service_info() -> &'static str {
    SERVICE_INFO
}
