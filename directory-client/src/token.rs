//! Bearer token retrieval from the server's `GET /jwt` endpoint

use std::time::Duration;

use crate::error::ClientError;

/// Fetches fresh tokens over plain HTTP
#[derive(Debug, Clone)]
pub struct TokenSource {
    http: reqwest::Client,
    url: String,
}

impl TokenSource {
    /// Token source for the server at `server` (e.g. `http://localhost:5001`)
    pub fn new(server: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            url: format!("{}/jwt", server.trim_end_matches('/')),
        })
    }

    /// URL tokens are requested from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request a new token; non-2xx responses are errors
    pub async fn fetch(&self) -> Result<String, ClientError> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        tracing::debug!(url = %self.url, "Fetched bearer token");
        Ok(body.trim().to_string())
    }
}
