//! Configuration loading.
//!
//! Settings come from a TOML file, located (highest priority first) at:
//!
//! 1. the path passed to [`Config::load`],
//! 2. the `DENVR_CONFIG` environment variable,
//! 3. `~/.config/denvr.toml`.
//!
//! ```toml
//! [defaults]
//! server = "https://api.cloud.denvrdata.com"
//! api = "v1"
//! cluster = "Msc1"
//! tenant = "denvr"
//! vpcid = "denvr"
//! rpool = "on-demand"
//! retries = 3
//!
//! [credentials]
//! username = "alice@example.com"
//! password = "..."
//! ```
//!
//! Credentials may also be supplied through `DENVR_APIKEY`,
//! `DENVR_USERNAME` and `DENVR_PASSWORD`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::DenvrError;

/// Environment variable overriding the config file location.
pub const ENV_CONFIG: &str = "DENVR_CONFIG";
/// Environment variable holding an API key.
pub const ENV_APIKEY: &str = "DENVR_APIKEY";
/// Environment variable holding the account username.
pub const ENV_USERNAME: &str = "DENVR_USERNAME";
/// Environment variable holding the account password.
pub const ENV_PASSWORD: &str = "DENVR_PASSWORD";

/// Default API server.
pub const DEFAULT_SERVER: &str = "https://api.cloud.denvrdata.com";
/// Default API version segment.
pub const DEFAULT_API: &str = "v1";
/// Default cluster.
pub const DEFAULT_CLUSTER: &str = "Msc1";
/// Default resource pool.
pub const DEFAULT_RPOOL: &str = "on-demand";
/// Default number of transport retries.
pub const DEFAULT_RETRIES: u32 = 3;

/// Raw `denvr.toml` contents.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    defaults: Option<DefaultsSection>,
    credentials: Option<Credentials>,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsSection {
    server: Option<String>,
    api: Option<String>,
    cluster: Option<String>,
    tenant: Option<String>,
    vpcid: Option<String>,
    rpool: Option<String>,
    retries: Option<u32>,
}

/// Account credentials, merged from the environment and the config file.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// API key; takes precedence over username/password.
    pub apikey: Option<String>,
    /// Username or email address.
    pub username: Option<String>,
    /// Account password.
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("apikey", &redact(&self.apikey))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl Credentials {
    /// Read credentials from `DENVR_APIKEY`, `DENVR_USERNAME` and `DENVR_PASSWORD`.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name| std::env::var(name).ok().filter(|v: &String| !v.is_empty());
        Self {
            apikey: var(ENV_APIKEY),
            username: var(ENV_USERNAME),
            password: var(ENV_PASSWORD),
        }
    }

    /// Fill unset fields from `file`. Values already present win.
    #[must_use]
    pub fn or(self, file: Option<&Credentials>) -> Self {
        let Some(file) = file else { return self };
        let pick = |own: Option<String>, other: &Option<String>| {
            own.or_else(|| other.clone().filter(|v| !v.is_empty()))
        };
        Self {
            apikey: pick(self.apikey, &file.apikey),
            username: pick(self.username, &file.username),
            password: pick(self.password, &file.password),
        }
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from.
    pub path: PathBuf,
    /// API server base URL, without trailing slash.
    pub server: String,
    /// API version segment (e.g. `v1`).
    pub api: String,
    /// Default cluster.
    pub cluster: String,
    /// Tenant name.
    pub tenant: String,
    /// Default VPC id (defaults to the tenant).
    pub vpc_id: String,
    /// Default resource pool.
    pub rpool: String,
    /// Transport retries for transient failures.
    pub retries: u32,
    /// Credentials after merging env and file.
    pub credentials: Credentials,
}

impl Config {
    /// Default config location (`~/.config/denvr.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config").join("denvr.toml"))
    }

    /// Resolve which file to read.
    ///
    /// # Errors
    /// Returns [`DenvrError::Config`] if no path is given and the home
    /// directory cannot be determined.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf, DenvrError> {
        if let Some(path) = path {
            return Ok(path.to_path_buf());
        }
        if let Some(env) = std::env::var_os(ENV_CONFIG).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(env));
        }
        Self::default_path()
            .ok_or_else(|| DenvrError::Config("could not determine home directory".to_string()))
    }

    /// Load configuration from disk, merging credentials from the environment.
    ///
    /// # Errors
    /// Returns [`DenvrError::Config`] if the file cannot be read, is not valid
    /// TOML, or lacks a tenant.
    pub fn load(path: Option<&Path>) -> Result<Self, DenvrError> {
        let path = Self::resolve_path(path)?;
        debug!(path = %path.display(), "Loading config");

        let content = std::fs::read_to_string(&path).map_err(|e| {
            DenvrError::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        Self::parse(&content, path, Credentials::from_env())
    }

    /// Build a config from TOML text. `env` credentials win over the file's.
    ///
    /// # Errors
    /// Returns [`DenvrError::Config`] on invalid TOML or a missing tenant.
    pub fn parse(content: &str, path: PathBuf, env: Credentials) -> Result<Self, DenvrError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| DenvrError::Config(format!("invalid TOML in {}: {e}", path.display())))?;

        let mut config = Self {
            path,
            server: DEFAULT_SERVER.to_string(),
            api: DEFAULT_API.to_string(),
            cluster: DEFAULT_CLUSTER.to_string(),
            tenant: String::new(),
            vpc_id: String::new(),
            rpool: DEFAULT_RPOOL.to_string(),
            retries: DEFAULT_RETRIES,
            credentials: env.or(file.credentials.as_ref()),
        };

        if let Some(defaults) = file.defaults {
            if let Some(server) = defaults.server {
                config.server = server.trim_matches('/').to_string();
            }
            if let Some(api) = defaults.api {
                config.api = api;
            }
            if let Some(cluster) = defaults.cluster {
                config.cluster = cluster;
            }
            config.tenant = defaults.tenant.ok_or_else(|| {
                DenvrError::Config(format!(
                    "a tenant value must be specified in the config {}",
                    config.path.display()
                ))
            })?;
            config.vpc_id = defaults.vpcid.unwrap_or_else(|| config.tenant.clone());
            if let Some(rpool) = defaults.rpool {
                config.rpool = rpool;
            }
            if let Some(retries) = defaults.retries {
                config.retries = retries;
            }
        }

        Ok(config)
    }

    /// Full URL for an API path such as `servers/virtual/GetServers`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.server,
            self.api,
            path.trim_start_matches('/')
        )
    }
}
