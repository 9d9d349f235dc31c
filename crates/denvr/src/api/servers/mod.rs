//! Server APIs: virtual machines and applications.

pub mod applications;
pub mod virtual_servers;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status reported for virtual servers and application instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Pending,
    Provisioning,
    Starting,
    Online,
    Stopping,
    Offline,
    Deleting,
    Error,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ServerStatus {
    /// Wire representation, e.g. `ONLINE`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Provisioning => "PROVISIONING",
            Self::Starting => "STARTING",
            Self::Online => "ONLINE",
            Self::Stopping => "STOPPING",
            Self::Offline => "OFFLINE",
            Self::Deleting => "DELETING",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the resource is in a settled state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Online | Self::Offline | Self::Error)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
