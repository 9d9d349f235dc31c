//! Status-based checks: "became reachable" and "became stopped".

use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use super::{Check, CheckOutcome, Waitable};
use crate::api::servers::ServerStatus;
use crate::error::DenvrError;

/// A client that can re-read the status of the resources it returns.
#[async_trait]
pub trait StatusSource: Waitable {
    /// Identifying fields needed to fetch a resource again.
    type Target: Clone + fmt::Debug + Send + Sync + 'static;

    /// Extract the identifying fields from an action result.
    ///
    /// # Errors
    /// Returns an error if the result lacks any identifying field.
    fn target(observed: &Self::Output) -> Result<Self::Target, DenvrError>;

    /// Fetch the current state of `target`.
    async fn fetch_status(&self, target: &Self::Target) -> Result<Self::Output, DenvrError>;

    /// Status field of a fetched resource.
    fn status(observed: &Self::Output) -> Option<&ServerStatus>;
}

/// Passes once a freshly fetched resource reports `desired`.
///
/// The identifying fields are taken from the first result this check sees
/// and reused for every later evaluation; later action results are ignored.
pub struct StatusCheck<C: StatusSource> {
    client: C,
    desired: ServerStatus,
    target: Option<C::Target>,
}

impl<C: StatusSource> StatusCheck<C> {
    /// Check for `desired` using `client` for the follow-up reads.
    pub fn new(client: C, desired: ServerStatus) -> Self {
        Self {
            client,
            desired,
            target: None,
        }
    }

    /// "Became reachable": waits for [`ServerStatus::Online`].
    pub fn reachable(client: &C) -> Box<dyn Check<C::Output>> {
        Box::new(Self::new(client.clone(), ServerStatus::Online))
    }

    /// "Became stopped": waits for [`ServerStatus::Offline`].
    pub fn stopped(client: &C) -> Box<dyn Check<C::Output>> {
        Box::new(Self::new(client.clone(), ServerStatus::Offline))
    }

    /// Status this check waits for.
    pub fn desired(&self) -> &ServerStatus {
        &self.desired
    }
}

#[async_trait]
impl<C: StatusSource> Check<C::Output> for StatusCheck<C> {
    async fn check(&mut self, observed: C::Output) -> Result<CheckOutcome<C::Output>, DenvrError> {
        let target = match self.target.clone() {
            Some(target) => target,
            None => {
                let target = C::target(&observed)?;
                self.target = Some(target.clone());
                target
            }
        };

        let current = self.client.fetch_status(&target).await?;
        let passed = C::status(&current) == Some(&self.desired);

        debug!(
            kind = %C::KIND,
            target = ?target,
            status = ?C::status(&current),
            desired = %self.desired,
            passed,
            "Checked resource status"
        );

        Ok(CheckOutcome {
            passed,
            observation: current,
        })
    }
}
