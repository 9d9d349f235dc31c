//! Authentication against the Denvr API.
//!
//! Two schemes are supported:
//!
//! - [`ApiKey`] sends `Authorization: ApiKey <key>`.
//! - [`Bearer`] logs in with a username and password, caches the access and
//!   refresh tokens, and refreshes the access token once it expires.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::DenvrError;
use crate::response::parse_response;

/// Produces the `Authorization` header for API requests.
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Header value to send with the next request.
    async fn authorization(&self) -> Result<String, DenvrError>;
}

/// Pick an authenticator for the resolved credentials.
///
/// An API key wins over username/password.
///
/// # Errors
/// Returns [`DenvrError::Auth`] if neither an API key nor a complete
/// username/password pair is available.
pub fn from_credentials(
    credentials: &Credentials,
    config_path: &Path,
    server: &str,
    http: Client,
) -> Result<Arc<dyn Authenticator>, DenvrError> {
    if let Some(key) = &credentials.apikey {
        return Ok(Arc::new(ApiKey::new(key.clone())));
    }

    match (&credentials.username, &credentials.password) {
        (Some(username), Some(password)) => Ok(Arc::new(Bearer::new(
            server,
            username.clone(),
            password.clone(),
            http,
        ))),
        _ => Err(DenvrError::Auth(format!(
            "Please provide credentials via environment variables or the [credentials] section in {}.",
            config_path.display()
        ))),
    }
}

/// Static API key authentication.
#[derive(Clone)]
pub struct ApiKey {
    key: String,
}

impl ApiKey {
    /// Wrap an API key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey").field("key", &"<redacted>").finish()
    }
}

#[async_trait]
impl Authenticator for ApiKey {
    async fn authorization(&self) -> Result<String, DenvrError> {
        Ok(format!("ApiKey {}", self.key))
    }
}

/// Body for `POST /api/TokenAuth/Authenticate`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateBody<'a> {
    user_name_or_email_address: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateResult {
    access_token: String,
    refresh_token: String,
    expire_in_seconds: i64,
    refresh_token_expire_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResult {
    access_token: String,
    expire_in_seconds: i64,
}

/// Cached token state.
#[derive(Debug, Clone)]
pub struct Tokens {
    /// Current access token.
    pub access_token: String,
    /// Token used to mint new access tokens.
    pub refresh_token: String,
    /// When the access token stops being valid.
    pub access_expires: DateTime<Utc>,
    /// When the refresh token stops being valid.
    pub refresh_expires: DateTime<Utc>,
}

/// Username/password authentication with token refresh.
pub struct Bearer {
    server: String,
    username: String,
    password: String,
    http: Client,
    tokens: Mutex<Option<Tokens>>,
}

impl fmt::Debug for Bearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bearer")
            .field("server", &self.server)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Bearer {
    /// Create a bearer authenticator. No request is made until the first
    /// call to [`Authenticator::authorization`].
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: password.into(),
            http,
            tokens: Mutex::new(None),
        }
    }

    /// Snapshot of the cached tokens, if logged in.
    pub async fn tokens(&self) -> Option<Tokens> {
        self.tokens.lock().await.clone()
    }

    async fn authenticate(&self) -> Result<Tokens, DenvrError> {
        let url = format!("{}/api/TokenAuth/Authenticate", self.server);
        debug!(url = %url, username = %self.username, "Authenticating");

        let response = self
            .http
            .post(&url)
            .json(&AuthenticateBody {
                user_name_or_email_address: &self.username,
                password: &self.password,
            })
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        let result: AuthenticateResult = parse_response(status, &body)
            .map_err(|e| DenvrError::Auth(format!("login failed: {e}")))?;

        let now = Utc::now();
        info!(username = %self.username, "Authenticated");
        Ok(Tokens {
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            access_expires: now + Duration::seconds(result.expire_in_seconds),
            refresh_expires: now + Duration::seconds(result.refresh_token_expire_in_seconds),
        })
    }

    async fn refresh(&self, tokens: &mut Tokens) -> Result<(), DenvrError> {
        let url = format!("{}/api/TokenAuth/RefreshToken", self.server);
        debug!(url = %url, "Refreshing access token");

        let response = self
            .http
            .get(&url)
            .query(&[("refreshToken", tokens.refresh_token.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        let result: RefreshResult = parse_response(status, &body)
            .map_err(|e| DenvrError::Auth(format!("token refresh failed: {e}")))?;

        tokens.access_token = result.access_token;
        tokens.access_expires = Utc::now() + Duration::seconds(result.expire_in_seconds);
        Ok(())
    }
}

#[async_trait]
impl Authenticator for Bearer {
    async fn authorization(&self) -> Result<String, DenvrError> {
        let mut guard = self.tokens.lock().await;

        let tokens = match guard.take() {
            Some(tokens) => tokens,
            None => self.authenticate().await?,
        };
        let tokens = guard.insert(tokens);

        let now = Utc::now();
        if now >= tokens.refresh_expires {
            return Err(DenvrError::Auth(
                "refresh token has expired, unable to refresh access token".to_string(),
            ));
        }
        if now >= tokens.access_expires {
            self.refresh(tokens).await?;
        }

        Ok(format!("Bearer {}", tokens.access_token))
    }
}
