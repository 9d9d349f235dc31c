//! Application API client.

use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::models::{
    ApplicationAvailability, ApplicationCatalogItem, ApplicationConfiguration, ApplicationDetails,
    ApplicationInstance, ApplicationRef, CreateCatalogApplicationRequest,
    CreateCustomApplicationRequest,
};
use crate::api::servers::ServerStatus;
use crate::api::Items;
use crate::error::DenvrError;
use crate::session::Session;
use crate::waiter::{Action, ClientKind, StatusSource, Waitable};

const BASE_PATH: &str = "servers/applications";

pub const CREATE_CATALOG_APPLICATION: &str = "CreateCatalogApplication";
pub const CREATE_CUSTOM_APPLICATION: &str = "CreateCustomApplication";
pub const START_APPLICATION: &str = "StartApplication";
pub const STOP_APPLICATION: &str = "StopApplication";
pub const GET_APPLICATION_DETAILS: &str = "GetApplicationDetails";
pub const DESTROY_APPLICATION: &str = "DestroyApplication";

/// Arguments accepted by [`ApplicationClient`] actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationArgs {
    CreateCatalog(CreateCatalogApplicationRequest),
    CreateCustom(CreateCustomApplicationRequest),
    Application(ApplicationRef),
}

impl From<CreateCatalogApplicationRequest> for ApplicationArgs {
    fn from(request: CreateCatalogApplicationRequest) -> Self {
        Self::CreateCatalog(request)
    }
}

impl From<CreateCustomApplicationRequest> for ApplicationArgs {
    fn from(request: CreateCustomApplicationRequest) -> Self {
        Self::CreateCustom(request)
    }
}

impl From<ApplicationRef> for ApplicationArgs {
    fn from(application: ApplicationRef) -> Self {
        Self::Application(application)
    }
}

impl ApplicationArgs {
    fn mismatch(&self, operation: &'static str, expected: &str) -> DenvrError {
        let got = match self {
            Self::CreateCatalog(_) => "a catalog create request",
            Self::CreateCustom(_) => "a custom create request",
            Self::Application(_) => "an application reference",
        };
        DenvrError::InvalidArguments {
            operation,
            reason: format!("expected {expected}, got {got}"),
        }
    }

    fn into_application(self, operation: &'static str) -> Result<ApplicationRef, DenvrError> {
        match self {
            Self::Application(application) => Ok(application),
            other => Err(other.mismatch(operation, "an application reference")),
        }
    }
}

#[derive(Serialize)]
struct ApplicationBody<'a> {
    id: &'a str,
    cluster: &'a str,
}

/// Client for `/api/{version}/servers/applications/*`.
#[derive(Debug, Clone)]
pub struct ApplicationClient {
    session: Session,
}

impl ApplicationClient {
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

    fn application_query(application: &ApplicationRef) -> [(&'static str, String); 2] {
        [
            ("Id", application.id.clone()),
            ("Cluster", application.cluster.clone()),
        ]
    }

    fn cluster_or_default(&self, cluster: Option<&String>) -> Option<String> {
        cluster
            .cloned()
            .or_else(|| Some(self.session.config().cluster.clone()).filter(|c| !c.is_empty()))
    }

    /// List application instances.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_applications(&self) -> Result<Vec<ApplicationInstance>, DenvrError> {
        let applications: Items<ApplicationInstance> =
            self.session.get(&Self::path("GetApplications"), &[]).await?;
        debug!(count = applications.items.len(), "Listed applications");
        Ok(applications.items)
    }

    /// Fetch one application.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_application_details(
        &self,
        application: &ApplicationRef,
    ) -> Result<ApplicationDetails, DenvrError> {
        self.session
            .get(
                &Self::path("GetApplicationDetails"),
                &Self::application_query(application),
            )
            .await
    }

    /// Launch an application from the catalog.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn create_catalog_application(
        &self,
        request: &CreateCatalogApplicationRequest,
    ) -> Result<ApplicationDetails, DenvrError> {
        let config = self.session.config();
        let request = CreateCatalogApplicationRequest {
            cluster: self.cluster_or_default(request.cluster.as_ref()),
            resource_pool: request.resource_pool.clone().or_else(|| Some(config.rpool.clone())),
            ..request.clone()
        };
        info!(
            name = %request.name,
            item = %request.application_catalog_item_name,
            version = %request.application_catalog_item_version,
            "Creating catalog application"
        );
        self.session
            .post(&Self::path("CreateCatalogApplication"), &request)
            .await
    }

    /// Launch an application from a container image.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn create_custom_application(
        &self,
        request: &CreateCustomApplicationRequest,
    ) -> Result<ApplicationDetails, DenvrError> {
        let config = self.session.config();
        let request = CreateCustomApplicationRequest {
            cluster: self.cluster_or_default(request.cluster.as_ref()),
            resource_pool: request.resource_pool.clone().or_else(|| Some(config.rpool.clone())),
            ..request.clone()
        };
        info!(name = %request.name, image = %request.image_url, "Creating custom application");
        self.session
            .post(&Self::path("CreateCustomApplication"), &request)
            .await
    }

    /// Start a stopped application.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn start_application(
        &self,
        application: &ApplicationRef,
    ) -> Result<ApplicationDetails, DenvrError> {
        info!(id = %application.id, cluster = %application.cluster, "Starting application");
        self.post_ref("StartApplication", application).await
    }

    /// Stop a running application.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn stop_application(
        &self,
        application: &ApplicationRef,
    ) -> Result<ApplicationDetails, DenvrError> {
        info!(id = %application.id, cluster = %application.cluster, "Stopping application");
        self.post_ref("StopApplication", application).await
    }

    /// Destroy an application.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn destroy_application(
        &self,
        application: &ApplicationRef,
    ) -> Result<ApplicationDetails, DenvrError> {
        info!(id = %application.id, cluster = %application.cluster, "Destroying application");
        self.session
            .delete(
                &Self::path("DestroyApplication"),
                &Self::application_query(application),
            )
            .await
    }

    /// List the hardware packages on offer.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_configurations(&self) -> Result<Vec<ApplicationConfiguration>, DenvrError> {
        let configurations: Items<ApplicationConfiguration> =
            self.session.get(&Self::path("GetConfigurations"), &[]).await?;
        Ok(configurations.items)
    }

    /// Capacity per hardware package in `cluster` and `resource_pool`.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_availability(
        &self,
        cluster: &str,
        resource_pool: &str,
    ) -> Result<Vec<ApplicationAvailability>, DenvrError> {
        let query = [
            ("cluster", cluster.to_string()),
            ("resourcePool", resource_pool.to_string()),
        ];
        let availability: Items<ApplicationAvailability> = self
            .session
            .get(&Self::path("GetAvailability"), &query)
            .await?;
        Ok(availability.items)
    }

    /// List catalog applications.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_application_catalog_items(
        &self,
    ) -> Result<Vec<ApplicationCatalogItem>, DenvrError> {
        let items: Items<ApplicationCatalogItem> = self
            .session
            .get(&Self::path("GetApplicationCatalogItems"), &[])
            .await?;
        Ok(items.items)
    }

    async fn post_ref(
        &self,
        endpoint: &str,
        application: &ApplicationRef,
    ) -> Result<ApplicationDetails, DenvrError> {
        let body = ApplicationBody {
            id: &application.id,
            cluster: &application.cluster,
        };
        self.session.post(&Self::path(endpoint), &body).await
    }

    fn application_action<F, Fut>(
        &self,
        name: &'static str,
        call: F,
    ) -> Action<ApplicationArgs, ApplicationDetails>
    where
        F: Fn(Self, ApplicationArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApplicationDetails, DenvrError>> + Send + 'static,
    {
        let client = self.clone();
        Action::new(name, move |args| call(client.clone(), args))
    }
}

impl Waitable for ApplicationClient {
    const KIND: ClientKind = ClientKind::APPLICATION;
    type Args = ApplicationArgs;
    type Output = ApplicationDetails;

    fn action(&self, name: &str) -> Option<Action<ApplicationArgs, ApplicationDetails>> {
        let action = match name {
            CREATE_CATALOG_APPLICATION => {
                self.application_action(CREATE_CATALOG_APPLICATION, |client, args| async move {
                    match args {
                        ApplicationArgs::CreateCatalog(request) => {
                            client.create_catalog_application(&request).await
                        }
                        other => Err(other.mismatch(CREATE_CATALOG_APPLICATION, "a catalog create request")),
                    }
                })
            }
            CREATE_CUSTOM_APPLICATION => {
                self.application_action(CREATE_CUSTOM_APPLICATION, |client, args| async move {
                    match args {
                        ApplicationArgs::CreateCustom(request) => {
                            client.create_custom_application(&request).await
                        }
                        other => Err(other.mismatch(CREATE_CUSTOM_APPLICATION, "a custom create request")),
                    }
                })
            }
            START_APPLICATION => {
                self.application_action(START_APPLICATION, |client, args| async move {
                    client
                        .start_application(&args.into_application(START_APPLICATION)?)
                        .await
                })
            }
            STOP_APPLICATION => {
                self.application_action(STOP_APPLICATION, |client, args| async move {
                    client
                        .stop_application(&args.into_application(STOP_APPLICATION)?)
                        .await
                })
            }
            GET_APPLICATION_DETAILS => {
                self.application_action(GET_APPLICATION_DETAILS, |client, args| async move {
                    client
                        .get_application_details(&args.into_application(GET_APPLICATION_DETAILS)?)
                        .await
                })
            }
            DESTROY_APPLICATION => {
                self.application_action(DESTROY_APPLICATION, |client, args| async move {
                    client
                        .destroy_application(&args.into_application(DESTROY_APPLICATION)?)
                        .await
                })
            }
            _ => return None,
        };
        Some(action)
    }
}

#[async_trait]
impl StatusSource for ApplicationClient {
    type Target = ApplicationRef;

    fn target(observed: &ApplicationDetails) -> Result<ApplicationRef, DenvrError> {
        observed.application_ref().ok_or_else(|| {
            DenvrError::InvalidResponse(format!(
                "application response lacks instance id or cluster: {observed:?}"
            ))
        })
    }

    async fn fetch_status(&self, target: &ApplicationRef) -> Result<ApplicationDetails, DenvrError> {
        self.get_application_details(target).await
    }

    fn status(observed: &ApplicationDetails) -> Option<&ServerStatus> {
        observed.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::servers::applications::{ImageRepository, StorageOptions};
    use crate::config::{Config, Credentials};
    use serde_json::json;
    use std::path::PathBuf;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApplicationClient {
        let content = format!(
            "[defaults]\nserver = \"{}\"\ncluster = \"Hou1\"\ntenant = \"denvr\"\n\n[credentials]\napikey = \"k\"\n",
            server.uri()
        );
        let config =
            Config::parse(&content, PathBuf::from("denvr.toml"), Credentials::default()).unwrap();
        ApplicationClient::new(Session::new(config).unwrap())
    }

    fn details_json(status: &str) -> serde_json::Value {
        json!({
            "result": {
                "instanceDetails": {
                    "id": "jupyter-1",
                    "cluster": "Hou1",
                    "status": status,
                    "hardwarePackageName": "g-nvidia-1xa100-40gb-pcie-14vcpu-112gb"
                },
                "applicationCatalogItem": {
                    "name": "jupyter-notebook",
                    "versions": [{"name": "python-3.11.9"}]
                }
            }
        })
    }

    #[tokio::test]
    async fn test_get_application_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/applications/GetApplicationDetails"))
            .and(query_param("Id", "jupyter-1"))
            .and(query_param("Cluster", "Hou1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(details_json("ONLINE")))
            .expect(1)
            .mount(&server)
            .await;

        let details = client_for(&server)
            .get_application_details(&ApplicationRef::new("jupyter-1", "Hou1"))
            .await
            .unwrap();

        assert_eq!(details.status(), Some(&ServerStatus::Online));
        assert_eq!(details.application_ref(), Some(ApplicationRef::new("jupyter-1", "Hou1")));
        let item = details.application_catalog_item.unwrap();
        assert_eq!(item.versions.len(), 1);
    }

    #[tokio::test]
    async fn test_start_application_posts_identifiers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/servers/applications/StartApplication"))
            .and(body_json(json!({"id": "jupyter-1", "cluster": "Hou1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(details_json("STARTING")))
            .expect(1)
            .mount(&server)
            .await;

        let action = client_for(&server).action(START_APPLICATION).unwrap();
        let details = action
            .invoke(
                &CancellationToken::new(),
                ApplicationRef::new("jupyter-1", "Hou1").into(),
            )
            .await
            .unwrap();
        assert_eq!(details.status(), Some(&ServerStatus::Starting));
    }

    #[tokio::test]
    async fn test_create_catalog_application_fills_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/servers/applications/CreateCatalogApplication"))
            .and(body_json(json!({
                "name": "jupyter-1",
                "hardwarePackageName": "g-nvidia-1xa100-40gb-pcie-14vcpu-112gb",
                "applicationCatalogItemName": "jupyter-notebook",
                "applicationCatalogItemVersion": "python-3.11.9",
                "cluster": "Hou1",
                "resourcePool": "on-demand",
                "personalSharedStorage": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(details_json("PENDING")))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateCatalogApplicationRequest {
            name: "jupyter-1".to_string(),
            hardware_package_name: "g-nvidia-1xa100-40gb-pcie-14vcpu-112gb".to_string(),
            application_catalog_item_name: "jupyter-notebook".to_string(),
            application_catalog_item_version: "python-3.11.9".to_string(),
            storage: StorageOptions {
                personal_shared_storage: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let details = client_for(&server)
            .create_catalog_application(&request)
            .await
            .unwrap();
        assert_eq!(details.status(), Some(&ServerStatus::Pending));
    }

    #[tokio::test]
    async fn test_configurations_use_camel_case() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/servers/applications/GetConfigurations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "name": "g-nvidia-8xh100-80gb-sxm-198vcpu-970gb",
                    "description": "8x NVIDIA H100 SXM GPUs, 198 vCPUs, 970GB RAM",
                    "gpuCount": 8,
                    "gpuType": "nvidia.com/H100SXM480GB",
                    "gpuBrand": "NVIDIA",
                    "gpuName": "NVIDIA H100",
                    "vcpusCount": 198,
                    "memoryGb": 970,
                    "directAttachedStorageGb": 20000,
                    "pricePerHour": 19.52,
                    "clusters": ["Hou1", "Msc1"]
                }]
            })))
            .mount(&server)
            .await;

        let configurations = client_for(&server).get_configurations().await.unwrap();
        assert_eq!(configurations[0].gpu_count, Some(8));
        assert_eq!(configurations[0].price_per_hour, Some(19.52));
    }

    #[tokio::test]
    async fn test_create_action_rejects_reference() {
        let server = MockServer::start().await;
        let action = client_for(&server).action(CREATE_CUSTOM_APPLICATION).unwrap();

        let err = action
            .invoke(
                &CancellationToken::new(),
                ApplicationRef::new("jupyter-1", "Hou1").into(),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("expected a custom create request"));
    }

    #[test]
    fn test_image_repository_password_is_redacted() {
        let repo = ImageRepository {
            hostname: "ghcr.io".to_string(),
            username: "me".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{repo:?}").contains("hunter2"));
    }
}
