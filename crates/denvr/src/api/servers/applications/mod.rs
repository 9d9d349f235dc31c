//! Applications: catalog or custom container workloads on dedicated GPUs.

mod client;
mod models;

pub use client::{
    ApplicationArgs, ApplicationClient, CREATE_CATALOG_APPLICATION, CREATE_CUSTOM_APPLICATION,
    DESTROY_APPLICATION, GET_APPLICATION_DETAILS, START_APPLICATION, STOP_APPLICATION,
};
pub use models::{
    ApplicationAvailability, ApplicationCatalogItem, ApplicationConfiguration, ApplicationDetails,
    ApplicationInstance, ApplicationRef, CatalogItemVersion, CreateCatalogApplicationRequest,
    CreateCustomApplicationRequest, ImageRepository, SecurityContext, StorageOptions,
};
