//! Waiter - polls an API operation until a completion check passes.
//!
//! A [`Waiter`] pairs an [`Action`] (one call of a client operation) with a
//! [`Check`] (decides whether the returned state is "done"). [`Waiter::wait`]
//! calls the action, evaluates the check, and sleeps for the configured
//! interval between attempts until the check passes, an error occurs, the
//! timeout elapses, or the caller cancels.
//!
//! The action runs on every attempt. Mutating operations are sent once by
//! the caller and confirmed with [`Waiter::polling`] over a read action.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use denvr::api::servers::virtual_servers::{
//!     ServerRef, VirtualServerClient, GET_SERVER, STOP_SERVER,
//! };
//! use denvr::waiter::{CheckRegistry, Waiter, WaiterOptions};
//! use denvr::Session;
//! use tokio_util::sync::CancellationToken;
//!
//! let client = VirtualServerClient::new(Session::from_path(None)?);
//! let vm = ServerRef::new("vm-1", "denvr", "Msc1");
//! client.stop_server(&vm).await?;
//!
//! let waiter = Waiter::polling(
//!     CheckRegistry::global(),
//!     &client,
//!     STOP_SERVER,
//!     GET_SERVER,
//!     WaiterOptions::default(),
//! )?;
//! let server = waiter.wait(&CancellationToken::new(), vm.into()).await?;
//! println!("{:?}", server.status);
//! # Ok(())
//! # }
//! ```

mod action;
mod check;
mod error;
mod registry;
mod status;

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use action::{Action, ClientKind, Waitable};
pub use check::{Check, CheckOutcome};
pub use error::WaitError;
pub use registry::{CheckFactory, CheckRegistry};
pub use status::{StatusCheck, StatusSource};

/// Default upper bound on the total wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
/// Default pause between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Timing parameters of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterOptions {
    /// Elapsed time after which an unpassed check becomes a timeout.
    pub timeout: Duration,
    /// Sleep between consecutive attempts.
    pub interval: Duration,
}

impl Default for WaiterOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl WaiterOptions {
    /// Options with the given timeout and interval.
    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Reject a zero interval or an interval longer than the timeout.
    ///
    /// # Errors
    /// [`WaitError::InvalidOptions`] describing the offending value.
    pub fn validate(&self) -> Result<(), WaitError> {
        if self.interval.is_zero() {
            return Err(WaitError::InvalidOptions(
                "interval must be greater than zero".to_string(),
            ));
        }
        if self.interval > self.timeout {
            return Err(WaitError::InvalidOptions(format!(
                "interval {:?} exceeds timeout {:?}",
                self.interval, self.timeout
            )));
        }
        Ok(())
    }
}

/// Polls one action until its check passes.
///
/// A waiter is consumed by [`wait`](Waiter::wait); checks may carry state
/// between evaluations, so each wait needs its own waiter.
pub struct Waiter<A, R> {
    action: Action<A, R>,
    check: Box<dyn Check<R>>,
    options: WaiterOptions,
}

impl<A, R> fmt::Debug for Waiter<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("action", &self.action.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<A, R> Waiter<A, R>
where
    A: Clone + Send + 'static,
    R: fmt::Debug + Send + 'static,
{
    /// Waiter for `action` on `client` using the global check registry and
    /// default options.
    ///
    /// # Errors
    /// [`WaitError::ActionNotFound`] or [`WaitError::CheckNotFound`].
    pub fn new<C>(client: &C, action: &str) -> Result<Self, WaitError>
    where
        C: Waitable<Args = A, Output = R>,
    {
        Self::with_registry(CheckRegistry::global(), client, action, WaiterOptions::default())
    }

    /// Like [`new`](Waiter::new) with explicit options.
    ///
    /// # Errors
    /// As [`new`](Waiter::new), plus [`WaitError::InvalidOptions`].
    pub fn with_options<C>(client: &C, action: &str, options: WaiterOptions) -> Result<Self, WaitError>
    where
        C: Waitable<Args = A, Output = R>,
    {
        Self::with_registry(CheckRegistry::global(), client, action, options)
    }

    /// Waiter resolving its check from `registry`.
    ///
    /// # Errors
    /// [`WaitError::ActionNotFound`] if `client` has no such action,
    /// [`WaitError::CheckNotFound`] if `registry` has no check for it,
    /// [`WaitError::InvalidOptions`] if `options` fail validation.
    pub fn with_registry<C>(
        registry: &CheckRegistry,
        client: &C,
        action: &str,
        options: WaiterOptions,
    ) -> Result<Self, WaitError>
    where
        C: Waitable<Args = A, Output = R>,
    {
        let resolved = client.action(action).ok_or_else(|| WaitError::ActionNotFound {
            kind: C::KIND,
            action: action.to_string(),
        })?;
        let check = registry.resolve(client, action)?;
        Self::from_parts(resolved, check, options)
    }

    /// Waiter that confirms the outcome of `completed` by polling the
    /// read-only `read` action with the check registered for `completed`.
    ///
    /// The caller performs the mutating call itself, exactly once, and then
    /// waits on the resource it returned. [`wait`](Waiter::wait) repeats its
    /// action on every attempt, so only reads belong there.
    ///
    /// # Errors
    /// [`WaitError::ActionNotFound`] if `client` has no `read` action,
    /// [`WaitError::CheckNotFound`] if `registry` has no check for
    /// `completed`, [`WaitError::InvalidOptions`] if `options` fail validation.
    pub fn polling<C>(
        registry: &CheckRegistry,
        client: &C,
        completed: &str,
        read: &str,
        options: WaiterOptions,
    ) -> Result<Self, WaitError>
    where
        C: Waitable<Args = A, Output = R>,
    {
        let resolved = client.action(read).ok_or_else(|| WaitError::ActionNotFound {
            kind: C::KIND,
            action: read.to_string(),
        })?;
        let check = registry.resolve(client, completed)?;
        Self::from_parts(resolved, check, options)
    }

    /// Waiter from an explicit action and check.
    ///
    /// # Errors
    /// [`WaitError::InvalidOptions`] if `options` fail validation.
    pub fn from_parts(
        action: Action<A, R>,
        check: Box<dyn Check<R>>,
        options: WaiterOptions,
    ) -> Result<Self, WaitError> {
        options.validate()?;
        Ok(Self {
            action,
            check,
            options,
        })
    }

    /// Timing parameters of this waiter.
    pub fn options(&self) -> WaiterOptions {
        self.options
    }

    /// Name of the polled action.
    pub fn action_name(&self) -> &'static str {
        self.action.name()
    }

    /// Poll until the check passes and return the observation it produced.
    ///
    /// Every attempt calls the action with a clone of `args`. Action and check
    /// errors end the wait immediately. After a failed check the loop gives up
    /// once more than `timeout` has elapsed since the start, so the total
    /// duration is bounded by roughly `timeout + interval` plus call time.
    ///
    /// # Errors
    /// [`WaitError::Action`], [`WaitError::Check`], [`WaitError::Timeout`] or
    /// [`WaitError::Cancelled`].
    pub async fn wait(mut self, cancel: &CancellationToken, args: A) -> Result<R, WaitError> {
        let action = self.action.name();
        let WaiterOptions { timeout, interval } = self.options;
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let observed = self.action.invoke(cancel, args.clone()).await?;

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(WaitError::Cancelled),
                outcome = self.check.check(observed) => outcome.map_err(WaitError::Check)?,
            };

            if outcome.passed {
                debug!(action, attempts, elapsed = ?start.elapsed(), "Wait condition met");
                return Ok(outcome.observation);
            }

            let elapsed = start.elapsed();
            if elapsed > timeout {
                warn!(
                    action,
                    attempts,
                    ?elapsed,
                    last = ?outcome.observation,
                    "Timed out waiting for condition"
                );
                return Err(WaitError::Timeout {
                    action,
                    elapsed,
                    attempts,
                });
            }

            debug!(action, attempts, ?elapsed, "Condition not met, sleeping {:?}", interval);
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(WaitError::Cancelled),
                () = tokio::time::sleep(interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::servers::ServerStatus;
    use crate::error::DenvrError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Check that replays a scripted list of results and counts calls.
    struct Scripted {
        results: VecDeque<Result<bool, DenvrError>>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn boxed(results: Vec<Result<bool, DenvrError>>, calls: &Arc<AtomicUsize>) -> Box<dyn Check<u32>> {
            Box::new(Self {
                results: results.into(),
                calls: calls.clone(),
            })
        }
    }

    #[async_trait]
    impl Check<u32> for Scripted {
        async fn check(&mut self, observed: u32) -> Result<CheckOutcome<u32>, DenvrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let passed = self.results.pop_front().unwrap_or(Ok(false))?;
            Ok(CheckOutcome {
                passed,
                observation: observed,
            })
        }
    }

    fn counting_action(calls: &Arc<AtomicUsize>) -> Action<u32, u32> {
        let calls = calls.clone();
        Action::infallible("Count", move |base: u32| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { base + u32::try_from(n).unwrap_or(u32::MAX) }
        })
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    /// Paused-clock timers may round deadlines up to the next millisecond.
    fn assert_about(actual: Duration, expected: Duration) {
        let slack = Duration::from_millis(50);
        assert!(
            actual >= expected && actual <= expected + slack,
            "expected about {expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_on_first_attempt_without_sleeping() {
        let action_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));
        let waiter = Waiter::from_parts(
            counting_action(&action_calls),
            Scripted::boxed(vec![Ok(true)], &check_calls),
            WaiterOptions::new(secs(5), secs(1)),
        )
        .unwrap();

        let start = Instant::now();
        let out = waiter.wait(&CancellationToken::new(), 100).await.unwrap();

        assert_eq!(out, 100);
        assert_eq!(action_calls.load(Ordering::SeqCst), 1);
        assert_eq!(check_calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_observation_of_passing_attempt() {
        let action_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));
        let waiter = Waiter::from_parts(
            counting_action(&action_calls),
            Scripted::boxed(vec![Ok(false), Ok(false), Ok(false), Ok(true)], &check_calls),
            WaiterOptions::new(secs(5), secs(1)),
        )
        .unwrap();

        let start = Instant::now();
        let out = waiter.wait(&CancellationToken::new(), 10).await.unwrap();

        // Fourth call observes 10 + 3.
        assert_eq!(out, 13);
        assert_eq!(action_calls.load(Ordering::SeqCst), 4);
        assert_about(start.elapsed(), secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_error_stops_before_check() {
        let check_calls = Arc::new(AtomicUsize::new(0));
        let action: Action<u32, u32> = Action::new("Explode", |_| async {
            Err(DenvrError::InvalidResponse("boom".to_string()))
        });
        let waiter = Waiter::from_parts(
            action,
            Scripted::boxed(vec![Ok(true)], &check_calls),
            WaiterOptions::default(),
        )
        .unwrap();

        let err = waiter.wait(&CancellationToken::new(), 0).await.unwrap_err();

        assert!(matches!(err, WaitError::Action { action: "Explode", .. }));
        assert_eq!(check_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_stops_polling() {
        let action_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));
        let waiter = Waiter::from_parts(
            counting_action(&action_calls),
            Scripted::boxed(
                vec![
                    Ok(false),
                    Err(DenvrError::InvalidResponse("lost".to_string())),
                ],
                &check_calls,
            ),
            WaiterOptions::new(secs(60), secs(1)),
        )
        .unwrap();

        let err = waiter.wait(&CancellationToken::new(), 0).await.unwrap_err();

        assert!(matches!(err, WaitError::Check(DenvrError::InvalidResponse(_))));
        assert_eq!(action_calls.load(Ordering::SeqCst), 2);
        assert_eq!(check_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_budget_is_exceeded() {
        let action_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));
        let waiter = Waiter::from_parts(
            counting_action(&action_calls),
            Scripted::boxed(Vec::new(), &check_calls),
            WaiterOptions::new(Duration::from_millis(2500), secs(1)),
        )
        .unwrap();

        let start = Instant::now();
        let err = waiter.wait(&CancellationToken::new(), 0).await.unwrap_err();
        let elapsed = start.elapsed();

        // Attempts at t=0,1,2 are within budget; t=3 exceeds it.
        match err {
            WaitError::Timeout {
                action,
                elapsed: reported,
                attempts,
            } => {
                assert_eq!(action, "Count");
                assert_eq!(attempts, 4);
                assert_about(reported, secs(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_about(elapsed, secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_duration_is_bounded_by_timeout_plus_interval() {
        let action_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));
        let options = WaiterOptions::new(Duration::from_millis(4100), Duration::from_millis(700));
        let waiter = Waiter::from_parts(
            counting_action(&action_calls),
            Scripted::boxed(Vec::new(), &check_calls),
            options,
        )
        .unwrap();

        let start = Instant::now();
        let err = waiter.wait(&CancellationToken::new(), 0).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_timeout());
        assert!(elapsed >= options.timeout);
        assert!(elapsed <= options.timeout + options.interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep() {
        let action_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));
        let waiter = Waiter::from_parts(
            counting_action(&action_calls),
            Scripted::boxed(Vec::new(), &check_calls),
            WaiterOptions::new(secs(600), secs(10)),
        )
        .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(secs(15)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let err = waiter.wait(&cancel, 0).await.unwrap_err();

        assert!(matches!(err, WaitError::Cancelled));
        assert_eq!(action_calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() < secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let action_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));
        let waiter = Waiter::from_parts(
            counting_action(&action_calls),
            Scripted::boxed(Vec::new(), &check_calls),
            WaiterOptions::default(),
        )
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let start = Instant::now();
        let err = waiter.wait(&cancel, 0).await.unwrap_err();
        assert!(matches!(err, WaitError::Cancelled));
        assert_eq!(check_calls.load(Ordering::SeqCst), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_option_validation() {
        assert!(WaiterOptions::default().validate().is_ok());
        assert_eq!(WaiterOptions::default().timeout, secs(600));
        assert_eq!(WaiterOptions::default().interval, secs(10));
        assert!(WaiterOptions::new(secs(1), secs(1)).validate().is_ok());

        let zero = WaiterOptions::new(secs(10), Duration::ZERO).validate().unwrap_err();
        assert!(matches!(zero, WaitError::InvalidOptions(_)));

        let too_long = WaiterOptions::new(secs(1), secs(2)).validate().unwrap_err();
        assert!(too_long.is_configuration());
    }

    #[test]
    fn test_from_parts_rejects_invalid_options() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = Waiter::from_parts(
            counting_action(&calls),
            Scripted::boxed(Vec::new(), &calls),
            WaiterOptions::new(secs(1), Duration::ZERO),
        )
        .unwrap_err();
        assert!(matches!(err, WaitError::InvalidOptions(_)));
    }

    #[test]
    fn test_debug_names_the_polled_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let waiter = Waiter::from_parts(
            counting_action(&calls),
            Scripted::boxed(Vec::new(), &calls),
            WaiterOptions::new(secs(5), secs(1)),
        )
        .unwrap();

        let rendered = format!("{waiter:?}");
        assert!(rendered.starts_with("Waiter"));
        assert!(rendered.contains("\"Count\""));
        assert_eq!(waiter.action_name(), "Count");
    }

    // Registry-driven construction against a status-reporting fake client.

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        id: String,
        status: ServerStatus,
    }

    #[derive(Clone)]
    struct FakeNodes {
        statuses: Arc<Mutex<VecDeque<ServerStatus>>>,
        fetches: Arc<AtomicUsize>,
        starts: Arc<AtomicUsize>,
    }

    impl FakeNodes {
        fn new(statuses: Vec<ServerStatus>) -> Self {
            Self {
                statuses: Arc::new(Mutex::new(statuses.into())),
                fetches: Arc::new(AtomicUsize::new(0)),
                starts: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Waitable for FakeNodes {
        const KIND: ClientKind = ClientKind::new("fake");
        type Args = String;
        type Output = Node;

        fn action(&self, name: &str) -> Option<Action<String, Node>> {
            match name {
                "StartNode" => {
                    let starts = self.starts.clone();
                    Some(Action::infallible("StartNode", move |id: String| {
                        starts.fetch_add(1, Ordering::SeqCst);
                        async move {
                            Node {
                                id,
                                status: ServerStatus::Starting,
                            }
                        }
                    }))
                }
                "GetNode" => Some(Action::infallible("GetNode", |id: String| async move {
                    Node {
                        id,
                        status: ServerStatus::Provisioning,
                    }
                })),
                _ => None,
            }
        }
    }

    #[async_trait]
    impl StatusSource for FakeNodes {
        type Target = String;

        fn target(observed: &Node) -> Result<String, DenvrError> {
            Ok(observed.id.clone())
        }

        async fn fetch_status(&self, target: &String) -> Result<Node, DenvrError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let status = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ServerStatus::Online);
            Ok(Node {
                id: target.clone(),
                status,
            })
        }

        fn status(observed: &Node) -> Option<&ServerStatus> {
            Some(&observed.status)
        }
    }

    fn fake_registry() -> CheckRegistry {
        let mut registry = CheckRegistry::new();
        registry.register::<FakeNodes>("StartNode", StatusCheck::reachable);
        registry
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_waiter_polls_until_online() {
        let client = FakeNodes::new(vec![
            ServerStatus::Provisioning,
            ServerStatus::Provisioning,
            ServerStatus::Provisioning,
            ServerStatus::Online,
        ]);
        let waiter = Waiter::with_registry(
            &fake_registry(),
            &client,
            "StartNode",
            WaiterOptions::new(secs(5), secs(1)),
        )
        .unwrap();

        let start = Instant::now();
        let node = waiter
            .wait(&CancellationToken::new(), "node-1".to_string())
            .await
            .unwrap();

        assert_eq!(node.status, ServerStatus::Online);
        assert_eq!(node.id, "node-1");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 4);
        assert_about(start.elapsed(), secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_waiter_times_out_when_never_online() {
        let client = FakeNodes::new(vec![ServerStatus::Provisioning; 10]);
        let waiter = Waiter::with_registry(
            &fake_registry(),
            &client,
            "StartNode",
            WaiterOptions::new(Duration::from_millis(2500), secs(1)),
        )
        .unwrap();

        let start = Instant::now();
        let err = waiter
            .wait(&CancellationToken::new(), "node-1".to_string())
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_about(start.elapsed(), secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_waiter_never_repeats_the_mutation() {
        let client = FakeNodes::new(vec![
            ServerStatus::Provisioning,
            ServerStatus::Provisioning,
            ServerStatus::Online,
        ]);
        let waiter = Waiter::polling(
            &fake_registry(),
            &client,
            "StartNode",
            "GetNode",
            WaiterOptions::new(secs(5), secs(1)),
        )
        .unwrap();
        assert_eq!(waiter.action_name(), "GetNode");

        let node = waiter
            .wait(&CancellationToken::new(), "node-1".to_string())
            .await
            .unwrap();

        assert_eq!(node.status, ServerStatus::Online);
        assert_eq!(client.starts.load(Ordering::SeqCst), 0);
        assert_eq!(client.fetches.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_polling_waiter_resolves_check_of_completed_action() {
        let client = FakeNodes::new(Vec::new());

        let missing_read = Waiter::polling(
            &fake_registry(),
            &client,
            "StartNode",
            "ReadNode",
            WaiterOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(missing_read, WaitError::ActionNotFound { ref action, .. } if action == "ReadNode"));

        // GetNode itself has no registered check; StartNode's is used.
        let missing_check = Waiter::polling(
            &fake_registry(),
            &client,
            "StopNode",
            "GetNode",
            WaiterOptions::default(),
        )
        .unwrap_err();
        assert!(missing_check.to_string().contains("StopNode"));
    }

    #[test]
    fn test_unknown_action_is_reported_before_check_lookup() {
        let client = FakeNodes::new(Vec::new());
        let err = Waiter::with_registry(
            &CheckRegistry::new(),
            &client,
            "RebootNode",
            WaiterOptions::default(),
        )
        .unwrap_err();

        match err {
            WaitError::ActionNotFound { kind, action } => {
                assert_eq!(kind.as_str(), "fake");
                assert_eq!(action, "RebootNode");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_check_is_reported() {
        let client = FakeNodes::new(Vec::new());
        let err = Waiter::with_registry(
            &CheckRegistry::new(),
            &client,
            "StartNode",
            WaiterOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, WaitError::CheckNotFound { .. }));
        assert!(err.to_string().contains("StartNode"));
    }

    #[test]
    fn test_registry_waiter_validates_options() {
        let client = FakeNodes::new(Vec::new());
        let err = Waiter::with_registry(
            &fake_registry(),
            &client,
            "StartNode",
            WaiterOptions::new(secs(1), secs(5)),
        )
        .unwrap_err();

        assert!(matches!(err, WaitError::InvalidOptions(_)));
    }
}
