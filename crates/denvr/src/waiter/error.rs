//! Errors returned by waiter construction and the poll loop.

use std::time::Duration;

use thiserror::Error;

use super::ClientKind;
use crate::error::DenvrError;

/// Why a wait could not be set up or did not succeed.
#[derive(Error, Debug)]
pub enum WaitError {
    /// The client has no operation with this name.
    #[error("Method {action} not found on {kind} client")]
    ActionNotFound { kind: ClientKind, action: String },

    /// No check is registered for this (client kind, action) pair.
    #[error("Check function not found for method {action} on {kind} client")]
    CheckNotFound { kind: ClientKind, action: String },

    /// Timeout/interval combination is unusable.
    #[error("Invalid waiter options: {0}")]
    InvalidOptions(String),

    /// The polled operation failed.
    #[error("Action {action} failed: {source}")]
    Action {
        action: &'static str,
        #[source]
        source: DenvrError,
    },

    /// The completion check failed.
    #[error("Check failed: {0}")]
    Check(#[source] DenvrError),

    /// The check never passed within the configured timeout.
    #[error("Waiting on {action} timed out after {elapsed:?} ({attempts} checks)")]
    Timeout {
        action: &'static str,
        elapsed: Duration,
        attempts: u32,
    },

    /// The caller cancelled the wait.
    #[error("Wait cancelled")]
    Cancelled,
}

impl WaitError {
    /// Whether this is a setup error raised before any polling.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ActionNotFound { .. } | Self::CheckNotFound { .. } | Self::InvalidOptions(_)
        )
    }

    /// Whether the wait ran out of time. Callers may retry with a longer budget.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
