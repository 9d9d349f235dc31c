//! Check registry - maps (client kind, action name) to a completion check.
//!
//! A process-wide registry is available through [`CheckRegistry::global`].
//! It is populated once, either with the built-in checks on first use or with
//! a custom registry passed to [`CheckRegistry::install`], and is read-only
//! afterwards. Independent registries can be built for tests or for callers
//! that want their own set of checks.

use std::any::Any;
use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::warn;

use super::{Check, ClientKind, StatusCheck, WaitError, Waitable};
use crate::api::servers::applications::{self, ApplicationClient};
use crate::api::servers::virtual_servers::{self, VirtualServerClient};

/// Builds a fresh check bound to the client that will be polled.
pub type CheckFactory<C> = fn(&C) -> Box<dyn Check<<C as Waitable>::Output>>;

type Entries = HashMap<ClientKind, HashMap<&'static str, Box<dyn Any + Send + Sync>>>;

static GLOBAL: OnceLock<CheckRegistry> = OnceLock::new();

/// Registry of completion checks keyed by client kind and action name.
#[derive(Default)]
pub struct CheckRegistry {
    entries: Entries,
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .flat_map(|(kind, actions)| actions.keys().map(move |action| format!("{kind}/{action}")))
            .collect();
        keys.sort();
        f.debug_struct("CheckRegistry").field("checks", &keys).finish()
    }
}

impl CheckRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in status checks.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register::<VirtualServerClient>(
            virtual_servers::CREATE_SERVER,
            StatusCheck::reachable,
        );
        registry.register::<VirtualServerClient>(
            virtual_servers::START_SERVER,
            StatusCheck::reachable,
        );
        registry.register::<VirtualServerClient>(virtual_servers::STOP_SERVER, StatusCheck::stopped);

        registry.register::<ApplicationClient>(
            applications::CREATE_CATALOG_APPLICATION,
            StatusCheck::reachable,
        );
        registry.register::<ApplicationClient>(
            applications::CREATE_CUSTOM_APPLICATION,
            StatusCheck::reachable,
        );
        registry.register::<ApplicationClient>(
            applications::START_APPLICATION,
            StatusCheck::reachable,
        );
        registry.register::<ApplicationClient>(
            applications::STOP_APPLICATION,
            StatusCheck::stopped,
        );

        registry
    }

    /// Process-wide registry, populated with the built-in checks on first use
    /// unless another registry was installed before.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::with_defaults)
    }

    /// Make this registry the process-wide one.
    ///
    /// # Errors
    /// Gives the registry back if the global one is already initialized.
    pub fn install(self) -> Result<&'static Self, Self> {
        GLOBAL.set(self)?;
        Ok(Self::global())
    }

    /// Register the check used when waiting on `action` of client type `C`.
    ///
    /// A second registration for the same pair replaces the first.
    pub fn register<C: Waitable>(&mut self, action: &'static str, factory: CheckFactory<C>) {
        let previous = self
            .entries
            .entry(C::KIND)
            .or_default()
            .insert(action, Box::new(factory));
        if previous.is_some() {
            warn!(kind = %C::KIND, action, "Replacing registered check");
        }
    }

    /// Whether a check is registered for `action` on client type `C`.
    pub fn contains<C: Waitable>(&self, action: &str) -> bool {
        self.factory::<C>(action).is_some()
    }

    /// Build the check registered for `action`, bound to `client`.
    ///
    /// # Errors
    /// [`WaitError::CheckNotFound`] if nothing is registered for the pair.
    pub fn resolve<C: Waitable>(
        &self,
        client: &C,
        action: &str,
    ) -> Result<Box<dyn Check<C::Output>>, WaitError> {
        let factory = self.factory::<C>(action).ok_or_else(|| WaitError::CheckNotFound {
            kind: C::KIND,
            action: action.to_string(),
        })?;
        Ok(factory(client))
    }

    fn factory<C: Waitable>(&self, action: &str) -> Option<CheckFactory<C>> {
        self.entries
            .get(&C::KIND)?
            .get(action)?
            .downcast_ref::<CheckFactory<C>>()
            .copied()
    }
}
