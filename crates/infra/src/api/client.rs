//! Authenticated API client
//!
//! Wraps the retrying [`HttpClient`] with the credential pipeline: bearer
//! attachment, proactive renewal before expiry, a single renewal-triggered
//! resend after a 401, and session-expiry notification. Callers never touch
//! tokens or authorization failures themselves.

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sourcedeck_common::auth::{
    FileTokenStore, MemoryTokenStore, RefreshCoordinator, RefreshTransport, SessionEvent,
    SessionEvents, TokenClaims, TokenStore, SESSION_EXPIRED_MESSAGE,
};
use sourcedeck_common::time::{Clock, SystemClock};
use sourcedeck_domain::Config;
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use super::refresh::{HttpRefreshTransport, REFRESH_TOKEN_PATH};
use super::request::ApiRequest;
use crate::http::HttpClient;

/// Message delivered when the stored token cannot be decoded.
pub const INVALID_SESSION_MESSAGE: &str = "Your session is invalid. Please log in again.";

/// API client with transparent credential handling.
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    refresh_threshold_secs: i64,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    coordinator: Arc<RefreshCoordinator>,
    events: SessionEvents,
}

impl ApiClient {
    /// Create a builder for fluent configuration.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Access the session event registry.
    ///
    /// The application subscribes here to react to token updates, removals,
    /// and session expiry.
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// The base URL all request paths are joined to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Persist a freshly issued token and announce it.
    ///
    /// Called after a successful credential exchange; the exchange itself is
    /// outside this crate.
    ///
    /// # Errors
    /// Returns `ApiError::Server` if the token cannot be persisted.
    pub async fn login(&self, token: &str) -> Result<(), ApiError> {
        self.store.set_token(token).await?;
        self.events.emit(&SessionEvent::TokenUpdated { token: token.to_string() });
        info!("Session established");
        Ok(())
    }

    /// Discard the stored token and announce its removal.
    ///
    /// # Errors
    /// Returns `ApiError::Server` if the token cannot be cleared.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.store.clear_token().await?;
        self.events.emit(&SessionEvent::TokenRemoved);
        info!("Session ended");
        Ok(())
    }

    /// The `sub` claim of the stored token, if one is stored and decodable.
    ///
    /// This is a heuristic read for display purposes; it proves nothing
    /// about the token's validity.
    ///
    /// # Errors
    /// Returns `ApiError::Server` if the store cannot be read.
    pub async fn current_subject(&self) -> Result<Option<String>, ApiError> {
        match self.store.get_token().await? {
            Some(token) => Ok(TokenClaims::decode(&token).ok().and_then(|claims| claims.sub)),
            None => Ok(None),
        }
    }

    /// Whether a token is currently stored.
    ///
    /// # Errors
    /// Returns `ApiError::Server` if the store cannot be read.
    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self.store.get_token().await?.is_some())
    }

    /// Send a request through the full credential pipeline.
    ///
    /// Attaches the stored token (requests without one go out
    /// unauthenticated, which is what the login call needs), renews
    /// proactively when the token is about to expire, and resends once
    /// after a 401 that a renewal could fix. The response is returned with
    /// its status untouched for anything that is not an authorization
    /// failure.
    ///
    /// # Errors
    /// - `ApiError::Auth` when the session is invalid, renewal fails, or a
    ///   401 is unrecoverable
    /// - transport errors mapped through their categories
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let mut request = request;

        loop {
            let token = self.prepare_token(&request).await?;
            let response = self.dispatch(&request, token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if token.is_none() {
                // The request went out unauthenticated; a 401 is an ordinary
                // outcome (failed login), not a session teardown.
                return Err(ApiError::Auth(format!(
                    "{} rejected with 401 on an unauthenticated request",
                    request.path()
                )));
            }

            if request.path() == REFRESH_TOKEN_PATH || request.is_retried() {
                return Err(self.expire_session(&request).await);
            }

            request.mark_retried();

            if self.store.get_token().await?.is_none() {
                // A concurrent failure already tore the session down.
                self.events.emit(&SessionEvent::SessionExpired {
                    message: SESSION_EXPIRED_MESSAGE.to_string(),
                });
                return Err(ApiError::Auth(format!(
                    "{} rejected with 401 and no stored token",
                    request.path()
                )));
            }

            debug!(path = %request.path(), "Renewing token after 401 and resending once");
            self.coordinator.refresh().await?;
        }
    }

    /// Execute a GET request.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, query), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::get(path);
        for (key, value) in query {
            request = request.query(*key, *value);
        }

        let response = self.send(request).await?;
        self.decode_response(path, response).await
    }

    /// Execute a POST request with a JSON body.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {}", e)))?;

        let response = self.send(ApiRequest::post(path).json(body)).await?;
        self.decode_response(path, response).await
    }

    /// Execute a PUT request with a JSON body.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {}", e)))?;

        let response = self.send(ApiRequest::put(path).json(body)).await?;
        self.decode_response(path, response).await
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self.send(ApiRequest::delete(path)).await?;
        self.decode_response(path, response).await
    }

    /// Resolve the token to attach, renewing proactively when needed.
    ///
    /// `None` means the request goes out unauthenticated.
    async fn prepare_token(&self, request: &ApiRequest) -> Result<Option<String>, ApiError> {
        let Some(token) = self.store.get_token().await? else {
            debug!(path = %request.path(), "No stored token; sending unauthenticated");
            return Ok(None);
        };

        let claims = match TokenClaims::decode(&token) {
            Ok(claims) => claims,
            Err(e) => {
                // An undecodable token is an invalid session, not a tolerable
                // credential. The request is never sent.
                warn!(error = %e, "Stored token is not decodable; ending session");
                if let Err(store_err) = self.store.clear_token().await {
                    warn!(error = %store_err, "Failed to clear undecodable token");
                }
                self.events.emit(&SessionEvent::TokenRemoved);
                self.events.emit(&SessionEvent::SessionExpired {
                    message: INVALID_SESSION_MESSAGE.to_string(),
                });
                return Err(ApiError::Auth(e.to_string()));
            }
        };

        let wants_renewal = request.path() != REFRESH_TOKEN_PATH
            && !request.is_retried()
            && claims.expires_within(self.refresh_threshold_secs, self.clock.as_ref());

        if wants_renewal {
            debug!(path = %request.path(), "Token near expiry; renewing before send");
            let renewed = self.coordinator.refresh().await?;
            return Ok(Some(renewed));
        }

        Ok(Some(token))
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self.http.request(request.method().clone(), &url);

        if !request.query_params().is_empty() {
            builder = builder.query(request.query_params());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        Ok(self.http.send(builder).await?)
    }

    /// Tear the session down after an unrecoverable authorization failure.
    ///
    /// A token still in the store is cleared and announced; with nothing
    /// stored the failure just propagates.
    async fn expire_session(&self, request: &ApiRequest) -> ApiError {
        match self.store.get_token().await {
            Ok(Some(_)) => {
                warn!(path = %request.path(), "Unrecoverable 401; ending session");
                if let Err(e) = self.store.clear_token().await {
                    warn!(error = %e, "Failed to clear token while ending session");
                }
                self.events.emit(&SessionEvent::TokenRemoved);
                self.events.emit(&SessionEvent::SessionExpired {
                    message: SESSION_EXPIRED_MESSAGE.to_string(),
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read token while ending session"),
        }

        ApiError::Auth(format!("{} rejected with 401", request.path()))
    }

    async fn decode_response<R: DeserializeOwned>(
        &self,
        path: &str,
        response: Response,
    ) -> Result<R, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, path, body));
        }

        // 204/205 carry no body; deserialize from null for ()-style results
        let result: R = if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ApiError::Client(format!(
                    "No content response ({}), but response type cannot be deserialized from empty body",
                    status.as_u16()
                ))
            })?
        } else {
            response
                .json()
                .await
                .map_err(|e| ApiError::Client(format!("Failed to parse response: {}", e)))?
        };

        debug!(path = %path, "Request successful");
        Ok(result)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

fn map_status_error(status: StatusCode, path: &str, body: String) -> ApiError {
    let message = if body.is_empty() {
        format!("{} returned status {}", path, status)
    } else {
        format!("{} returned status {}: {}", path, status, body)
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::Auth(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiError::RateLimit(message)
    } else if status.is_server_error() {
        ApiError::Server(message)
    } else if status.is_client_error() {
        ApiError::Client(message)
    } else {
        ApiError::Network(message)
    }
}

/// Builder for [`ApiClient`].
///
/// Store, clock, and renewal transport are injectable; each defaults to the
/// production implementation when not set.
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<Config>,
    store: Option<Arc<dyn TokenStore>>,
    clock: Option<Arc<dyn Clock>>,
    transport: Option<Arc<dyn RefreshTransport>>,
}

impl ApiClientBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the token store.
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the clock used by expiry checks.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the renewal transport.
    pub fn refresh_transport(mut self, transport: Arc<dyn RefreshTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the API client.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();

        let http = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.api.timeout_secs))
            .max_attempts(config.api.max_attempts as usize)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        let store: Arc<dyn TokenStore> = match self.store {
            Some(store) => store,
            None => match &config.auth.token_path {
                Some(path) => Arc::new(FileTokenStore::new(path)),
                None => Arc::new(MemoryTokenStore::new()),
            },
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let transport: Arc<dyn RefreshTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpRefreshTransport::new(http.clone(), &config.api.base_url)),
        };

        let events = SessionEvents::new();
        let coordinator =
            Arc::new(RefreshCoordinator::new(transport, Arc::clone(&store), events.clone()));

        let refresh_threshold_secs =
            i64::try_from(config.auth.refresh_threshold_secs).unwrap_or(i64::MAX);

        Ok(ApiClient {
            http,
            base_url: config.api.base_url,
            refresh_threshold_secs,
            store,
            clock,
            coordinator,
            events,
        })
    }
}
