//! # State Transitions
//!
//! The result of evaluating a state against an incoming message: either
//! advance to a named state carrying a payload, or halt.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{state_names, DIAGNOSTIC_CAUSE_KEY};

/// Outcome of evaluating a state's `next` against an incoming message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StateTransition {
    /// Advance to the named state, persisting `payload` alongside it
    Advance { state: String, payload: Value },
    /// No further message is expected; legal only from a final state
    Halt,
}

impl StateTransition {
    /// Advance to an arbitrary named state
    pub fn advance(state: impl Into<String>, payload: Value) -> Self {
        Self::Advance {
            state: state.into(),
            payload,
        }
    }

    /// Advance to the terminal success state
    pub fn to_end() -> Self {
        Self::advance(state_names::END, Value::Null)
    }

    /// Advance to the terminal failure state with a diagnostic cause
    pub fn to_error(cause: impl Into<String>) -> Self {
        Self::advance(
            state_names::ERROR,
            json!({ DIAGNOSTIC_CAUSE_KEY: cause.into() }),
        )
    }

    /// Target state name, if this transition advances
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Advance { state, .. } => Some(state),
            Self::Halt => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_transition_carries_cause() {
        let transition = StateTransition::to_error("conversion failed");
        match &transition {
            StateTransition::Advance { state, payload } => {
                assert_eq!(state, state_names::ERROR);
                assert_eq!(payload[DIAGNOSTIC_CAUSE_KEY], "conversion failed");
            }
            StateTransition::Halt => panic!("expected advance"),
        }
        assert_eq!(transition.target(), Some("ERROR"));
    }

    #[test]
    fn test_end_transition() {
        let transition = StateTransition::to_end();
        assert_eq!(transition.target(), Some("END"));
        assert_eq!(StateTransition::Halt.target(), None);
    }
}
