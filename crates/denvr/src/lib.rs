//! Client SDK for the Denvr Dataworks GPU cloud.
//!
//! The crate wraps the Denvr REST API in typed clients and adds a generic
//! [`Waiter`] that repeatedly calls an operation until a completion check
//! passes, e.g. "start this server and return once it is online".
//!
//! # Usage
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use denvr::api::servers::virtual_servers::{
//!     ServerRef, VirtualServerClient, GET_SERVER, START_SERVER,
//! };
//! use denvr::waiter::{CheckRegistry, Waiter, WaiterOptions};
//! use denvr::Session;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! // Reads ~/.config/denvr.toml (or $DENVR_CONFIG)
//! let session = Session::from_path(None)?;
//! let client = VirtualServerClient::new(session);
//!
//! // Send the start once, then poll GetServer until it is online.
//! let vm = ServerRef::new("my-vm", "denvr", "Msc1");
//! client.start_server(&vm).await?;
//!
//! let options = WaiterOptions::new(Duration::from_secs(300), Duration::from_secs(5));
//! let waiter = Waiter::polling(CheckRegistry::global(), &client, START_SERVER, GET_SERVER, options)?;
//! let server = waiter.wait(&CancellationToken::new(), vm.into()).await?;
//! println!("{} is {:?}", server.id.unwrap_or_default(), server.status);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`config`] loads the TOML config file and environment credentials
//! - [`auth`] provides API key and bearer token authenticators
//! - [`session`] sends authenticated requests with retries
//! - [`response`] normalizes response bodies and API errors
//! - [`api`] holds the virtual server and application clients
//! - [`waiter`] polls any client action until its registered check passes

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod session;
pub mod waiter;

pub use config::Config;
pub use error::DenvrError;
pub use session::{RetryPolicy, Session};
pub use waiter::{WaitError, Waiter, WaiterOptions};
