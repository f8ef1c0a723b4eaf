//! # Machine State Protocol
//!
//! The per-state contract every workflow state implements, plus the two
//! terminal states shared by every actor graph: END (success) and ERROR
//! (failure).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::errors::{ActorError, ActorResult};
use super::transition::StateTransition;
use crate::constants::state_names;

/// Policy governing how an actor recovers when the process restarts while the
/// actor was mid-action in a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeBehavior {
    /// Re-enter the state without redoing the action
    Ignore,
    /// Redo the action from scratch with the same payload
    Retry,
    /// Reset the actor to its designated initial state
    Restart,
    /// Force an immediate transition to ERROR
    Error,
}

impl fmt::Display for ResumeBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Retry => write!(f, "retry"),
            Self::Restart => write!(f, "restart"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One named state of an actor's workflow graph.
///
/// `next` evaluates an incoming message against the payload persisted with
/// the state, runs the state's action (which may dispatch work to remote
/// workers), and yields the transition to apply. It must be pure with respect
/// to already-applied transitions: the same (state, message, pending) triple
/// always computes the same target, and any side effects must be idempotent
/// or safely retryable under [`ResumeBehavior::Retry`]. Under at-least-once
/// delivery a state may see a duplicate of the message that brought it here;
/// it must re-enter itself rather than fail.
#[async_trait]
pub trait MachineState: Send + Sync {
    /// Stable identifier, unique within the actor's graph; doubles as the
    /// persisted resume-point key
    fn name(&self) -> &str;

    /// Recovery policy applied when the process restarts mid-action
    fn resume_behavior(&self) -> ResumeBehavior;

    /// Terminal states have no outgoing transition
    fn is_final(&self) -> bool {
        false
    }

    /// Evaluate an incoming message and compute the transition to apply.
    /// `pending` is the payload persisted alongside this state.
    async fn next(&self, message: &Value, pending: &Value) -> ActorResult<StateTransition>;
}

/// Terminal success state shared by all workflow graphs
#[derive(Debug, Default)]
pub struct EndState;

#[async_trait]
impl MachineState for EndState {
    fn name(&self) -> &str {
        state_names::END
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Ignore
    }

    fn is_final(&self) -> bool {
        true
    }

    async fn next(&self, _message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        Err(ActorError::contract_violation(
            "next() invoked on final state END",
        ))
    }
}

/// Well-known terminal failure state.
///
/// Reached when any other state's action fails unrecoverably or explicitly
/// signals failure. Resume behavior is Retry: a crash while entering ERROR is
/// safe to redo, since entering it has no side effects beyond being final.
#[derive(Debug, Default)]
pub struct ErrorState;

#[async_trait]
impl MachineState for ErrorState {
    fn name(&self) -> &str {
        state_names::ERROR
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Retry
    }

    fn is_final(&self) -> bool {
        true
    }

    async fn next(&self, _message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        Err(ActorError::contract_violation(
            "next() invoked on final state ERROR",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_final_states_fail_loudly_on_next() {
        let end = EndState;
        let error = ErrorState;

        assert!(end.is_final());
        assert!(error.is_final());

        let result = end.next(&json!(null), &Value::Null).await;
        assert!(matches!(
            result,
            Err(ActorError::ContractViolation { .. })
        ));

        let result = error.next(&json!(null), &Value::Null).await;
        assert!(matches!(
            result,
            Err(ActorError::ContractViolation { .. })
        ));
    }

    #[test]
    fn test_error_state_resume_is_retry() {
        assert_eq!(ErrorState.resume_behavior(), ResumeBehavior::Retry);
        assert_eq!(EndState.resume_behavior(), ResumeBehavior::Ignore);
    }

    #[test]
    fn test_resume_behavior_serde() {
        let json = serde_json::to_string(&ResumeBehavior::Retry).unwrap();
        assert_eq!(json, "\"retry\"");
        let parsed: ResumeBehavior = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ResumeBehavior::Retry);
    }
}
