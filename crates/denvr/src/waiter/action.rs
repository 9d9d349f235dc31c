//! Action adapter: API operations resolved by name into a uniform callable.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use super::WaitError;
use crate::error::DenvrError;

/// Stable identifier for a family of API clients, e.g. `virtual-server`.
///
/// Used together with an action name as the key into the
/// [`CheckRegistry`](super::CheckRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientKind(&'static str);

impl ClientKind {
    /// Virtual server clients.
    pub const VIRTUAL_SERVER: Self = Self("virtual-server");
    /// Application clients.
    pub const APPLICATION: Self = Self("application");

    /// Declare a client kind.
    #[must_use]
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    /// The tag string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An API client whose operations can be driven by a [`Waiter`](super::Waiter).
///
/// Implementors expose the operations that return their resource type
/// (`Output`) as [`Action`]s, looked up by name.
pub trait Waitable: Clone + Send + Sync + 'static {
    /// Dispatch tag for this client type.
    const KIND: ClientKind;

    /// Arguments accepted by this client's actions.
    type Args: Clone + Send + 'static;

    /// Resource type returned by this client's actions.
    type Output: Send + 'static;

    /// Resolve an operation by name, or `None` if this client has no such action.
    fn action(&self, name: &str) -> Option<Action<Self::Args, Self::Output>>;
}

type ActionFn<A, R> = Box<dyn Fn(A) -> BoxFuture<'static, Result<R, DenvrError>> + Send + Sync>;

/// A single API operation adapted to `args -> Result<R, DenvrError>`.
///
/// Each [`invoke`](Action::invoke) performs exactly one call of the
/// underlying operation.
pub struct Action<A, R> {
    name: &'static str,
    call: ActionFn<A, R>,
}

impl<A, R> fmt::Debug for Action<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}

impl<A, R> Action<A, R> {
    /// Name the action was resolved under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<A: Send + 'static, R: Send + 'static> Action<A, R> {
    /// Adapt a fallible operation.
    pub fn new<F, Fut>(name: &'static str, call: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, DenvrError>> + Send + 'static,
    {
        Self {
            name,
            call: Box::new(move |args| call(args).boxed()),
        }
    }

    /// Adapt an operation that cannot fail.
    pub fn infallible<F, Fut>(name: &'static str, call: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        Self::new(name, move |args| call(args).map(Ok))
    }

    /// Run the operation once.
    ///
    /// # Errors
    /// [`WaitError::Cancelled`] if `cancel` fires first, otherwise
    /// [`WaitError::Action`] wrapping the operation's error.
    pub async fn invoke(&self, cancel: &CancellationToken, args: A) -> Result<R, WaitError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(WaitError::Cancelled),
            result = (self.call)(args) => result.map_err(|source| WaitError::Action {
                action: self.name,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_invoke_forwards_arguments_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let action = Action::new("Double", move |n: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n * 2) }
        });

        let cancel = CancellationToken::new();
        assert_eq!(action.invoke(&cancel, 21).await.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(action.name(), "Double");
    }

    #[tokio::test]
    async fn test_invoke_wraps_operation_error() {
        let action: Action<(), u32> = Action::new("Broken", |()| async {
            Err(DenvrError::InvalidResponse("boom".to_string()))
        });

        let err = action.invoke(&CancellationToken::new(), ()).await.unwrap_err();
        match err {
            WaitError::Action { action, source } => {
                assert_eq!(action, "Broken");
                assert!(matches!(source, DenvrError::InvalidResponse(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_infallible_action() {
        let action = Action::infallible("Echo", |s: String| async move { s });
        let out = action
            .invoke(&CancellationToken::new(), "hello".to_string())
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_invoke_honors_cancellation() {
        let action: Action<(), u32> = Action::new("Hang", |()| futures::future::pending());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = action.invoke(&cancel, ()).await.unwrap_err();
        assert!(matches!(err, WaitError::Cancelled));
    }

    #[test]
    fn test_client_kind_display() {
        assert_eq!(ClientKind::VIRTUAL_SERVER.to_string(), "virtual-server");
        assert_eq!(ClientKind::new("custom").as_str(), "custom");
    }
}
