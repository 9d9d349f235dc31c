//! Virtual servers: GPU virtual machines billed by the hour.

mod client;
mod models;

pub use client::{
    VirtualServerArgs, VirtualServerClient, CREATE_SERVER, DESTROY_SERVER, GET_SERVER,
    START_SERVER, STOP_SERVER,
};
pub use models::{
    CreateServerRequest, ServerAvailability, ServerConfiguration, ServerRef, VirtualServerDetails,
};
