//! Virtual server API client.

use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::models::{
    CreateServerRequest, ServerAvailability, ServerConfiguration, ServerRef, VirtualServerDetails,
};
use crate::api::servers::ServerStatus;
use crate::api::Items;
use crate::error::DenvrError;
use crate::session::Session;
use crate::waiter::{Action, ClientKind, StatusSource, Waitable};

const BASE_PATH: &str = "servers/virtual";

/// `CreateServer` action name.
pub const CREATE_SERVER: &str = "CreateServer";
/// `StartServer` action name.
pub const START_SERVER: &str = "StartServer";
/// `StopServer` action name.
pub const STOP_SERVER: &str = "StopServer";
/// `GetServer` action name.
pub const GET_SERVER: &str = "GetServer";
/// `DestroyServer` action name.
pub const DESTROY_SERVER: &str = "DestroyServer";

/// Arguments accepted by [`VirtualServerClient`] actions.
#[derive(Debug, Clone, PartialEq)]
pub enum VirtualServerArgs {
    /// For `CreateServer`.
    Create(CreateServerRequest),
    /// For `StartServer`, `StopServer`, `GetServer` and `DestroyServer`.
    Server(ServerRef),
    /// For `DestroyServer` with explicit snapshot handling.
    Destroy {
        server: ServerRef,
        delete_snapshots: bool,
    },
}

impl From<CreateServerRequest> for VirtualServerArgs {
    fn from(request: CreateServerRequest) -> Self {
        Self::Create(request)
    }
}

impl From<ServerRef> for VirtualServerArgs {
    fn from(server: ServerRef) -> Self {
        Self::Server(server)
    }
}

impl VirtualServerArgs {
    fn into_create(self, operation: &'static str) -> Result<CreateServerRequest, DenvrError> {
        match self {
            Self::Create(request) => Ok(request),
            other => Err(DenvrError::InvalidArguments {
                operation,
                reason: format!("expected a create request, got {other:?}"),
            }),
        }
    }

    fn into_server(self, operation: &'static str) -> Result<ServerRef, DenvrError> {
        match self {
            Self::Server(server) | Self::Destroy { server, .. } => Ok(server),
            Self::Create(_) => Err(DenvrError::InvalidArguments {
                operation,
                reason: "expected a server reference, got a create request".to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
struct ServerBody<'a> {
    id: &'a str,
    namespace: &'a str,
    cluster: &'a str,
}

impl<'a> From<&'a ServerRef> for ServerBody<'a> {
    fn from(server: &'a ServerRef) -> Self {
        Self {
            id: &server.id,
            namespace: &server.namespace,
            cluster: &server.cluster,
        }
    }
}

/// Client for `/api/{version}/servers/virtual/*`.
#[derive(Debug, Clone)]
pub struct VirtualServerClient {
    session: Session,
}

impl VirtualServerClient {
    /// Create a client over `session`.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn path(endpoint: &str) -> String {
        format!("{BASE_PATH}/{endpoint}")
    }

    fn server_query(server: &ServerRef) -> Vec<(&'static str, String)> {
        vec![
            ("Id", server.id.clone()),
            ("Namespace", server.namespace.clone()),
            ("Cluster", server.cluster.clone()),
        ]
    }

    /// List servers, optionally restricted to one cluster.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_servers(
        &self,
        cluster: Option<&str>,
    ) -> Result<Vec<VirtualServerDetails>, DenvrError> {
        let query: Vec<(&str, String)> = cluster
            .map(|c| vec![("Cluster", c.to_string())])
            .unwrap_or_default();
        let servers: Items<VirtualServerDetails> =
            self.session.get(&Self::path("GetServers"), &query).await?;
        debug!(count = servers.items.len(), "Listed virtual servers");
        Ok(servers.items)
    }

    /// Fetch one server.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_server(&self, server: &ServerRef) -> Result<VirtualServerDetails, DenvrError> {
        self.session
            .get(&Self::path("GetServer"), &Self::server_query(server))
            .await
    }

    /// Create a server. Unset cluster, resource pool and VPC come from config.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn create_server(
        &self,
        request: &CreateServerRequest,
    ) -> Result<VirtualServerDetails, DenvrError> {
        let request = self.with_defaults(request);
        info!(
            name = %request.name,
            configuration = %request.configuration,
            cluster = ?request.cluster,
            "Creating virtual server"
        );
        self.session.post(&Self::path("CreateServer"), &request).await
    }

    /// Start a stopped server.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn start_server(&self, server: &ServerRef) -> Result<VirtualServerDetails, DenvrError> {
        info!(id = %server.id, cluster = %server.cluster, "Starting virtual server");
        self.session
            .post(&Self::path("StartServer"), &ServerBody::from(server))
            .await
    }

    /// Stop a running server.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn stop_server(&self, server: &ServerRef) -> Result<VirtualServerDetails, DenvrError> {
        info!(id = %server.id, cluster = %server.cluster, "Stopping virtual server");
        self.session
            .post(&Self::path("StopServer"), &ServerBody::from(server))
            .await
    }

    /// Destroy a server, optionally deleting its snapshots.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn destroy_server(
        &self,
        server: &ServerRef,
        delete_snapshots: bool,
    ) -> Result<VirtualServerDetails, DenvrError> {
        info!(id = %server.id, cluster = %server.cluster, delete_snapshots, "Destroying virtual server");
        let mut query = Self::server_query(server);
        query.push(("DeleteSnapshots", delete_snapshots.to_string()));
        self.session.delete(&Self::path("DestroyServer"), &query).await
    }

    /// List the hardware configurations on offer.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_configurations(&self) -> Result<Vec<ServerConfiguration>, DenvrError> {
        let configurations: Items<ServerConfiguration> =
            self.session.get(&Self::path("GetConfigurations"), &[]).await?;
        Ok(configurations.items)
    }

    /// Capacity per configuration in `cluster` and `resource_pool`.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_availability(
        &self,
        cluster: &str,
        resource_pool: &str,
    ) -> Result<Vec<ServerAvailability>, DenvrError> {
        let query = [
            ("cluster", cluster.to_string()),
            ("resourcePool", resource_pool.to_string()),
        ];
        let availability: Items<ServerAvailability> = self
            .session
            .get(&Self::path("GetAvailability"), &query)
            .await?;
        Ok(availability.items)
    }

    fn with_defaults(&self, request: &CreateServerRequest) -> CreateServerRequest {
        let config = self.session.config();
        let fill = |value: &Option<String>, default: &str| {
            value
                .clone()
                .or_else(|| (!default.is_empty()).then(|| default.to_string()))
        };

        CreateServerRequest {
            cluster: fill(&request.cluster, &config.cluster),
            rpool: fill(&request.rpool, &config.rpool),
            vpc: fill(&request.vpc, &config.vpc_id),
            ..request.clone()
        }
    }

    fn server_action<F, Fut>(&self, name: &'static str, call: F) -> Action<VirtualServerArgs, VirtualServerDetails>
    where
        F: Fn(Self, VirtualServerArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<VirtualServerDetails, DenvrError>> + Send + 'static,
    {
        let client = self.clone();
        Action::new(name, move |args| call(client.clone(), args))
    }
}

impl Waitable for VirtualServerClient {
    const KIND: ClientKind = ClientKind::VIRTUAL_SERVER;
    type Args = VirtualServerArgs;
    type Output = VirtualServerDetails;

    fn action(&self, name: &str) -> Option<Action<VirtualServerArgs, VirtualServerDetails>> {
        let action = match name {
            CREATE_SERVER => self.server_action(CREATE_SERVER, |client, args| async move {
                let request = args.into_create(CREATE_SERVER)?;
                client.create_server(&request).await
            }),
            START_SERVER => self.server_action(START_SERVER, |client, args| async move {
                client.start_server(&args.into_server(START_SERVER)?).await
            }),
            STOP_SERVER => self.server_action(STOP_SERVER, |client, args| async move {
                client.stop_server(&args.into_server(STOP_SERVER)?).await
            }),
            GET_SERVER => self.server_action(GET_SERVER, |client, args| async move {
                client.get_server(&args.into_server(GET_SERVER)?).await
            }),
            DESTROY_SERVER => self.server_action(DESTROY_SERVER, |client, args| async move {
                let delete_snapshots = matches!(
                    args,
                    VirtualServerArgs::Destroy {
                        delete_snapshots: true,
                        ..
                    }
                );
                let server = args.into_server(DESTROY_SERVER)?;
                client.destroy_server(&server, delete_snapshots).await
            }),
            _ => return None,
        };
        Some(action)
    }
}

#[async_trait]
impl StatusSource for VirtualServerClient {
    type Target = ServerRef;

    fn target(observed: &VirtualServerDetails) -> Result<ServerRef, DenvrError> {
        observed.server_ref().ok_or_else(|| {
            DenvrError::InvalidResponse(format!(
                "virtual server response lacks id, namespace or cluster: {observed:?}"
            ))
        })
    }

    async fn fetch_status(&self, target: &ServerRef) -> Result<VirtualServerDetails, DenvrError> {
        self.get_server(target).await
    }

    fn status(observed: &VirtualServerDetails) -> Option<&ServerStatus> {
        observed.status.as_ref()
    }
}
