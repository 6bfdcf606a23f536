//! Token renewal over HTTP
//!
//! Implements the renewal transport against the backend's refresh endpoint.
//! The call goes through [`HttpClient`] directly, bypassing the API client's
//! interception pipeline: a renewal that answered 401 must surface as a
//! failed renewal, never trigger another one.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use sourcedeck_common::auth::{AuthError, RefreshTransport};
use tracing::debug;

use crate::http::HttpClient;

/// Path of the renewal endpoint, relative to the API base URL.
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Renewal transport backed by the backend refresh endpoint.
pub struct HttpRefreshTransport {
    http: HttpClient,
    refresh_url: String,
}

impl HttpRefreshTransport {
    /// Create a transport renewing against `<base_url>/auth/refresh-token`.
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self { http, refresh_url: format!("{}{}", base_url, REFRESH_TOKEN_PATH) }
    }
}

#[async_trait]
impl RefreshTransport for HttpRefreshTransport {
    async fn renew(&self, current_token: &str) -> Result<String, AuthError> {
        debug!(url = %self.refresh_url, "Calling token renewal endpoint");

        let request = self
            .http
            .request(Method::POST, &self.refresh_url)
            .header("Authorization", format!("Bearer {}", current_token));

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| AuthError::Refresh(format!("renewal call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Refresh(format!("renewal endpoint returned {}", status)));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Refresh(format!("invalid renewal response: {}", e)))?;

        Ok(body.access_token)
    }
}
