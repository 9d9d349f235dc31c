//! Application API models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::servers::ServerStatus;

/// Identifies a single application instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRef {
    /// Application name.
    pub id: String,
    /// Cluster hosting the application.
    pub cluster: String,
}

impl ApplicationRef {
    /// Build a reference from its parts.
    pub fn new(id: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cluster: cluster.into(),
        }
    }
}

/// Runtime state of an application instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInstance {
    pub id: Option<String>,
    pub cluster: Option<String>,
    pub status: Option<ServerStatus>,
    pub tenant: Option<String>,
    pub created_by: Option<String>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub dns: Option<String>,
    pub resource_pool: Option<String>,
    pub hardware_package_name: Option<String>,
    pub image_url: Option<String>,
    pub application_catalog_item_name: Option<String>,
    pub application_catalog_item_version_name: Option<String>,
}

/// Application as returned by `GetApplicationDetails` and the mutating calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub instance_details: Option<ApplicationInstance>,
    pub application_catalog_item: Option<ApplicationCatalogItem>,
}

impl ApplicationDetails {
    /// Reference to this application, if the response carried id and cluster.
    pub fn application_ref(&self) -> Option<ApplicationRef> {
        let instance = self.instance_details.as_ref()?;
        Some(ApplicationRef {
            id: instance.id.clone()?,
            cluster: instance.cluster.clone()?,
        })
    }

    /// Status of the instance, if reported.
    pub fn status(&self) -> Option<&ServerStatus> {
        self.instance_details.as_ref()?.status.as_ref()
    }
}

/// Storage mounts shared by both application create requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_shared_storage: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_shared_storage: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_direct_attached_storage: Option<bool>,
}

/// Body of `CreateCatalogApplication`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCatalogApplicationRequest {
    pub name: String,
    pub hardware_package_name: String,
    pub application_catalog_item_name: String,
    pub application_catalog_item_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ssh_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jupyter_token: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub user_scripts: BTreeMap<String, String>,
    #[serde(flatten)]
    pub storage: StorageOptions,
}

/// Credentials for a private image registry.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRepository {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ImageRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRepository")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User and group the container runs as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    pub run_as_root: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_uid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_gid: Option<u32>,
}

/// Body of `CreateCustomApplication`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomApplicationRequest {
    pub name: String,
    pub hardware_package_name: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub image_cmd_override: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_repository: Option<ImageRepository>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_watcher_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_port: Option<u16>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub user_scripts: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    #[serde(flatten)]
    pub storage: StorageOptions,
}

/// Hardware package offered for applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfiguration {
    pub name: Option<String>,
    pub description: Option<String>,
    pub gpu_count: Option<u32>,
    pub gpu_type: Option<String>,
    pub gpu_brand: Option<String>,
    pub gpu_name: Option<String>,
    pub vcpus_count: Option<u32>,
    pub memory_gb: Option<u64>,
    pub direct_attached_storage_gb: Option<u64>,
    pub price_per_hour: Option<f64>,
    #[serde(default)]
    pub clusters: Vec<String>,
}

/// Capacity of one hardware package in a cluster and resource pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationAvailability {
    pub cluster: Option<String>,
    pub configuration: Option<String>,
    pub resource_pool: Option<String>,
    pub available: Option<bool>,
    pub count: Option<u32>,
}

/// One version of a catalog application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemVersion {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// Pre-packaged application that can be launched with `CreateCatalogApplication`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCatalogItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub versions: Vec<CatalogItemVersion>,
}
