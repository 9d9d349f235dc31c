//! Virtual server API models.

use serde::{Deserialize, Serialize};

use crate::api::servers::ServerStatus;

/// Identifies a single virtual server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRef {
    /// Server name.
    pub id: String,
    /// Tenant namespace the server lives in.
    pub namespace: String,
    /// Cluster hosting the server.
    pub cluster: String,
}

impl ServerRef {
    /// Build a reference from its parts.
    pub fn new(id: impl Into<String>, namespace: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            cluster: cluster.into(),
        }
    }
}

/// Virtual server as returned by `GetServer`, `GetServers` and the mutating calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerDetails {
    pub id: Option<String>,
    pub namespace: Option<String>,
    pub configuration: Option<String>,
    pub resource_pool: Option<String>,
    pub vpc_id: Option<String>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub image: Option<String>,
    pub dedicated_storage: Option<bool>,
    pub root_disk_size: Option<u64>,
    pub storage: Option<u64>,
    pub storage_type: Option<String>,
    pub gpu_type: Option<String>,
    pub gpus: Option<u32>,
    pub vcpus: Option<u32>,
    pub memory: Option<u64>,
    pub username: Option<String>,
    pub tenancy_name: Option<String>,
    pub cluster: Option<String>,
    pub status: Option<ServerStatus>,
}

impl VirtualServerDetails {
    /// Reference to this server, if the response carried all identifying fields.
    pub fn server_ref(&self) -> Option<ServerRef> {
        Some(ServerRef {
            id: self.id.clone()?,
            namespace: self.namespace.clone()?,
            cluster: self.cluster.clone()?,
        })
    }
}

/// Body of `CreateServer`.
///
/// Unset `cluster`, `rpool` and `vpc` are filled from the session config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServerRequest {
    pub name: String,
    pub configuration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ssh_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_storage_mount_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_shared_additional_storage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_storage: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_storage_mount_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_disk_size: Option<u64>,
}

impl CreateServerRequest {
    /// Minimal request for `configuration`.
    pub fn new(name: impl Into<String>, configuration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configuration: configuration.into(),
            ..Self::default()
        }
    }
}

/// Hardware configuration offered for virtual servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub user_friendly_name: Option<String>,
    pub description: Option<String>,
    pub os_version: Option<String>,
    pub os_type: Option<String>,
    pub storage: Option<u64>,
    pub gpu_type: Option<String>,
    pub gpu_family: Option<String>,
    pub gpu_brand: Option<String>,
    pub gpu_name: Option<String>,
    pub gpus: Option<u32>,
    pub vcpus: Option<u32>,
    pub memory: Option<u64>,
    pub price: Option<f64>,
    pub is_gpu_platform: Option<bool>,
    #[serde(default)]
    pub clusters: Vec<String>,
}

/// Capacity of one configuration in a cluster and resource pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAvailability {
    pub cluster: Option<String>,
    pub configuration: Option<String>,
    pub resource_pool: Option<String>,
    pub available: Option<bool>,
    pub count: Option<u32>,
}
