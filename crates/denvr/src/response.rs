//! Response normalization for the Denvr API.
//!
//! Most endpoints wrap their payload in an envelope:
//!
//! ```json
//! { "result": { ... }, "success": true, "error": { "code": 0, "message": "" } }
//! ```
//!
//! A few (notably the configuration listings) return the payload directly.
//! [`parse_response`] handles both shapes and turns error statuses into
//! [`DenvrError::Api`].

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::Regex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::error::DenvrError;

/// Zero timestamps (`0001-01-01T00:00:00`) mean "missing" on the server side.
static ZERO_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""0001-01-01T00:00:00(?:\.\d+)?""#).unwrap());

/// Timestamps that end right after the seconds carry no timezone.
static NO_TIMEZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?)""#).unwrap()
});

/// Error body sent alongside failed requests.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: Option<i64>,
    /// Human readable message.
    pub message: Option<String>,
}

/// Generic API envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Wrapped payload.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error details, if any.
    #[serde(default)]
    pub error: Option<ErrorBody>,
    /// Whether the server considers the request successful.
    #[serde(default)]
    pub success: Option<bool>,
}

/// Parse a raw response body into `T`.
///
/// # Errors
/// - [`DenvrError::Serialization`] if the body is not JSON or does not match `T`.
/// - [`DenvrError::Api`] if `status` is 400 or above.
pub fn parse_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, DenvrError> {
    let body = fix_malformed_time_formats(body);

    let value: serde_json::Value = serde_json::from_slice(&body)?;

    let envelope = match &value {
        serde_json::Value::Object(_) => Envelope::deserialize(&value).ok(),
        _ => None,
    };

    if status.is_client_error() || status.is_server_error() {
        let message = envelope
            .as_ref()
            .and_then(|e| e.error.as_ref())
            .and_then(|e| e.message.clone())
            .filter(|m| !m.is_empty());
        return Err(DenvrError::Api { status, message });
    }

    match envelope.and_then(|e| e.result).filter(|r| !r.is_null()) {
        Some(result) => Ok(serde_json::from_value(result)?),
        None => serde_json::from_value(value).map_err(|e| {
            warn!(error = %e, "Failed to parse unwrapped response");
            DenvrError::Serialization(e)
        }),
    }
}

/// Patch timestamps the server emits without a timezone.
///
/// Zero timestamps become `null`; naive timestamps get a `Z` suffix so they
/// decode as UTC.
#[must_use]
pub fn fix_malformed_time_formats(data: &[u8]) -> Cow<'_, [u8]> {
    match ZERO_TIME.replace_all(data, &b"null"[..]) {
        Cow::Borrowed(data) => NO_TIMEZONE.replace_all(data, &b"\"${1}Z\""[..]),
        Cow::Owned(data) => Cow::Owned(
            NO_TIMEZONE
                .replace_all(&data, &b"\"${1}Z\""[..])
                .into_owned(),
        ),
    }
}
