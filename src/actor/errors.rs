//! # Actor Engine Error Types
//!
//! Error taxonomy for the state-machine engine. Two classes matter to the run
//! loop: recoverable failures that drive the actor into its terminal ERROR
//! state, and fatal contract violations that abort the actor outright because
//! they indicate a programming or deployment defect rather than a runtime
//! condition. A third kind, [`ActorError::Jump`], is not a fault at all but
//! the engine's non-local transition signal.

use serde_json::Value;
use thiserror::Error;

/// Errors produced by the actor engine
#[derive(Error, Debug)]
pub enum ActorError {
    /// Non-local control-flow signal: unwinds to the run loop, which applies
    /// it exactly as if the state's action had returned `Advance(state, payload)`.
    /// Frequent and expected; carries no backtrace or captured context.
    #[error("jump to state {state}")]
    Jump { state: String, payload: Value },

    /// Transient failure inside a state's action (I/O, remote worker error).
    /// Converted by the run loop into a transition to ERROR.
    #[error("action failed in state {state}: {cause}")]
    ActionFailed { state: String, cause: String },

    /// Programming error: `next` invoked on a final state, duplicate state
    /// names, halt from a non-terminal context, or similar
    #[error("contract violation: {message}")]
    ContractViolation { message: String },

    /// A transition named a state that is not registered in the actor's graph
    #[error("unknown state '{state}' for actor {actor_id}")]
    UnknownState { actor_id: String, state: String },

    /// A message addressed an actor id absent from the registry
    #[error("unknown actor id '{actor_id}'")]
    UnknownActor { actor_id: String },

    /// The state store failed or was unreachable
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// Payload could not be serialized or deserialized
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The queue transport failed to accept or deliver a message
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ActorError {
    /// Create a control-flow jump signal
    pub fn jump(state: impl Into<String>, payload: Value) -> Self {
        Self::Jump {
            state: state.into(),
            payload,
        }
    }

    /// Create a transient action failure
    pub fn action_failed(state: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::ActionFailed {
            state: state.into(),
            cause: cause.into(),
        }
    }

    /// Create a contract violation error
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    /// Create an unknown state error
    pub fn unknown_state(actor_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self::UnknownState {
            actor_id: actor_id.into(),
            state: state.into(),
        }
    }

    /// Create an unknown actor error
    pub fn unknown_actor(actor_id: impl Into<String>) -> Self {
        Self::UnknownActor {
            actor_id: actor_id.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Fatal errors abort the actor instead of driving it into ERROR: they
    /// indicate a mismatched deployment or logic error, not a runtime condition
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation { .. } | Self::UnknownState { .. } | Self::UnknownActor { .. }
        )
    }

    /// Recoverable errors are absorbed by transitioning the actor to ERROR
    /// with a diagnostic payload
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ActionFailed { .. } | Self::Serialization(_) | Self::Transport { .. }
        )
    }
}

pub type ActorResult<T> = Result<T, ActorError>;

/// Abort the current action and request a transition to `state` carrying
/// `payload`, from any call depth. The run loop interprets the resulting
/// signal exactly like a returned `Advance(state, payload)`.
pub fn jump<T>(state: impl Into<String>, payload: Value) -> ActorResult<T> {
    Err(ActorError::jump(state, payload))
}
