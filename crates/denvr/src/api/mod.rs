//! Typed clients for the Denvr Dataworks API.

pub mod servers;

use serde::Deserialize;

/// List responses wrap their entries in `{"items": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Items<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}
