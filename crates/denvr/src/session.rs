//! HTTP session shared by the API clients.
//!
//! A [`Session`] owns the resolved [`Config`], the HTTP client, the
//! authenticator and the retry policy. Every API call goes through
//! [`Session::get`], [`Session::post`] or [`Session::delete`], which inject
//! auth headers, retry transient failures and normalize the response body.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{self, Authenticator};
use crate::config::Config;
use crate::error::DenvrError;
use crate::response::parse_response;

/// Default timeout for a single HTTP request.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Retry policy for transient transport failures.
///
/// Connection errors, `429` and `5xx` responses (except `501`) are retried
/// with exponential backoff clamped to `[wait_min, wait_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Smallest backoff.
    pub wait_min: Duration,
    /// Largest backoff.
    pub wait_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_RETRIES,
            wait_min: Duration::from_secs(2),
            wait_max: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-based).
    ///
    /// A numeric `Retry-After` header replaces the computed backoff, but only
    /// on `429` and `503` responses.
    #[must_use]
    pub fn backoff(
        &self,
        attempt: u32,
        status: Option<StatusCode>,
        headers: Option<&HeaderMap>,
    ) -> Duration {
        let honors_retry_after = matches!(
            status,
            Some(StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE)
        );
        if let Some(retry_after) = headers
            .filter(|_| honors_retry_after)
            .and_then(|h| h.get(RETRY_AFTER))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            return Duration::from_secs(retry_after);
        }

        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.wait_min
            .checked_mul(factor)
            .unwrap_or(self.wait_max)
            .clamp(self.wait_min, self.wait_max)
    }

    /// Whether a response status is worth retrying.
    #[must_use]
    pub fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
    }
}

/// Authenticated HTTP session.
#[derive(Clone)]
pub struct Session {
    config: Arc<Config>,
    http: Client,
    auth: Arc<dyn Authenticator>,
    retry: RetryPolicy,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("server", &self.config.server)
            .field("auth", &self.auth)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session from a resolved config.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the config has
    /// no usable credentials.
    pub fn new(config: Config) -> Result<Self, DenvrError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        let auth = auth::from_credentials(
            &config.credentials,
            &config.path,
            &config.server,
            http.clone(),
        )?;
        let retry = RetryPolicy {
            max_retries: config.retries,
            ..RetryPolicy::default()
        };

        Ok(Self {
            config: Arc::new(config),
            http,
            auth,
            retry,
        })
    }

    /// Load the config (see [`Config::load`]) and build a session from it.
    ///
    /// # Errors
    /// Returns an error if the config cannot be loaded or lacks credentials.
    pub fn from_path(path: Option<&Path>) -> Result<Self, DenvrError> {
        Self::new(Config::load(path)?)
    }

    /// Swap the authenticator.
    #[must_use]
    pub fn with_authenticator(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = auth;
        self
    }

    /// Swap the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The active retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Authenticated GET request.
    ///
    /// # Errors
    /// Returns an error on transport, auth, API or decode failure.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DenvrError> {
        let url = self.config.api_url(path);
        debug!(url = %url, "GET request");
        self.execute(self.http.request(Method::GET, &url).query(query))
            .await
    }

    /// Authenticated POST request with a JSON body.
    ///
    /// # Errors
    /// Returns an error on transport, auth, API or decode failure.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, DenvrError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.config.api_url(path);
        debug!(url = %url, "POST request");
        self.execute(self.http.request(Method::POST, &url).json(body))
            .await
    }

    /// Authenticated DELETE request.
    ///
    /// # Errors
    /// Returns an error on transport, auth, API or decode failure.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DenvrError> {
        let url = self.config.api_url(path);
        debug!(url = %url, "DELETE request");
        self.execute(self.http.request(Method::DELETE, &url).query(query))
            .await
    }

    /// Send a request, retrying transient failures, and parse the response.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DenvrError> {
        let mut attempt = 0;

        loop {
            let authorization = self.auth.authorization().await?;
            let builder = request
                .try_clone()
                .ok_or_else(|| DenvrError::InvalidArguments {
                    operation: "request",
                    reason: "request body cannot be retried".to_string(),
                })?
                .header(CONTENT_TYPE, "application/json")
                .header(AUTHORIZATION, authorization);

            let (status, headers, err) = match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !RetryPolicy::is_retryable(status) || attempt >= self.retry.max_retries {
                        let body = response.bytes().await?;
                        return parse_response(status, &body);
                    }
                    (
                        Some(status),
                        Some(response.headers().clone()),
                        format!("status {status}"),
                    )
                }
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.retry.max_retries => {
                    (None, None, e.to_string())
                }
                Err(e) => return Err(e.into()),
            };

            let wait = self.retry.backoff(attempt, status, headers.as_ref());
            attempt += 1;
            warn!(
                attempt,
                max_retries = self.retry.max_retries,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Retrying request"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
