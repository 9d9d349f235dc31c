//! Completion checks evaluated after every action call.

use async_trait::async_trait;

use crate::error::DenvrError;

/// Result of one check evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome<R> {
    /// Whether the awaited condition holds.
    pub passed: bool,
    /// Latest known state, returned to the caller on success.
    pub observation: R,
}

impl<R> CheckOutcome<R> {
    /// The condition holds.
    pub fn passed(observation: R) -> Self {
        Self {
            passed: true,
            observation,
        }
    }

    /// The condition does not hold yet.
    pub fn pending(observation: R) -> Self {
        Self {
            passed: false,
            observation,
        }
    }
}

/// Decides whether the state produced by an action is "done".
///
/// A check belongs to a single [`Waiter`](super::Waiter) and may keep state
/// across evaluations of that one wait.
#[async_trait]
pub trait Check<R>: Send {
    /// Evaluate the latest action result.
    async fn check(&mut self, observed: R) -> Result<CheckOutcome<R>, DenvrError>;
}
