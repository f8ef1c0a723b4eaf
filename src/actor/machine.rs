//! # State Machine Run Loop
//!
//! Drives one actor instance: receive message -> invoke the current state's
//! handler -> apply the resulting transition -> persist the new state ->
//! optionally derive an outbound message. Persistence always happens before
//! the outbound message is handed to the transport, so a crash on either side
//! of the persist is recoverable (redo the idempotent action, or resume in
//! the new state and re-derive the message).

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::errors::{ActorError, ActorResult};
use super::graph::StateGraph;
use super::persistence::{ActorStateStore, PersistedActorState};
use super::state::ResumeBehavior;
use super::transition::StateTransition;
use crate::constants::{is_suspension_point, state_names, DIAGNOSTIC_CAUSE_KEY};
use crate::messaging::message::ActorMessage;

/// Result of delivering one message (or one resume) to an actor
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The actor advanced to a new persisted state. `outbound` carries the
    /// self-addressed message that continues the workflow, when the new state
    /// is neither terminal nor a durable suspension point.
    Advanced {
        state: String,
        terminal: bool,
        outbound: Option<ActorMessage>,
    },
    /// Resume re-entered the persisted state without redoing its action
    ReEntered { state: String },
    /// The actor is already in a terminal state; the message was dropped
    AlreadyTerminal { state: String },
    /// Another writer advanced the persisted version first; delivery dropped
    /// (safe under at-least-once redelivery)
    Conflict,
    /// Nothing to resume: the actor has no persisted record yet
    Idle,
}

impl DeliveryOutcome {
    /// Persisted state name after this delivery, when one is known
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Advanced { state, .. }
            | Self::ReEntered { state }
            | Self::AlreadyTerminal { state } => Some(state),
            Self::Conflict | Self::Idle => None,
        }
    }
}

/// One actor instance: the current persisted state, the last payload, and the
/// run loop that drives transitions
pub struct StateMachine {
    actor_id: String,
    graph: Arc<StateGraph>,
    store: Arc<dyn ActorStateStore>,
}

impl StateMachine {
    pub fn new(
        actor_id: impl Into<String>,
        graph: Arc<StateGraph>,
        store: Arc<dyn ActorStateStore>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            graph,
            store,
        }
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    /// Current persisted record, if the actor has ever been driven
    pub async fn persisted(&self) -> ActorResult<Option<PersistedActorState>> {
        self.store.load(&self.actor_id).await
    }

    /// Deliver an externally received message to the actor's current state
    pub async fn deliver(&self, message: &Value) -> ActorResult<DeliveryOutcome> {
        let record = self
            .store
            .create_if_absent(&self.actor_id, self.graph.initial_state(), &Value::Null)
            .await?;

        let state = self
            .graph
            .resolve(&record.state_name)
            .ok_or_else(|| ActorError::unknown_state(&self.actor_id, &record.state_name))?;

        if state.is_final() {
            // Redelivery to a finished actor must be tolerated, not evaluated
            warn!(
                actor_id = %self.actor_id,
                state = %record.state_name,
                "Dropping message delivered to terminal actor"
            );
            return Ok(DeliveryOutcome::AlreadyTerminal {
                state: record.state_name,
            });
        }

        let transition = match state.next(message, &record.payload).await {
            Ok(transition @ StateTransition::Advance { .. }) => transition,
            // Halting from a non-final state is a contract violation, forced
            // into ERROR so the actor is reported as failed rather than stuck
            Ok(StateTransition::Halt) => StateTransition::to_error(format!(
                "halt from non-final state {}",
                record.state_name
            )),
            // The control-flow signal is applied exactly like a returned Advance
            Err(ActorError::Jump { state, payload }) => {
                StateTransition::Advance { state, payload }
            }
            Err(e) if e.is_recoverable() => {
                warn!(
                    actor_id = %self.actor_id,
                    state = %record.state_name,
                    error = %e,
                    "Action failed; transitioning actor to ERROR"
                );
                StateTransition::to_error(e.to_string())
            }
            // Contract violations, unknown states and persistence failures
            // abort the delivery instead of being absorbed
            Err(e) => return Err(e),
        };

        self.apply(record, transition).await
    }

    /// Resume the actor after an unclean stop, applying the persisted state's
    /// resume policy
    pub async fn resume(&self) -> ActorResult<DeliveryOutcome> {
        let Some(record) = self.store.load(&self.actor_id).await? else {
            return Ok(DeliveryOutcome::Idle);
        };

        let state = self
            .graph
            .resolve(&record.state_name)
            .ok_or_else(|| ActorError::unknown_state(&self.actor_id, &record.state_name))?;

        if state.is_final() {
            return Ok(DeliveryOutcome::AlreadyTerminal {
                state: record.state_name,
            });
        }

        debug!(
            actor_id = %self.actor_id,
            state = %record.state_name,
            behavior = %state.resume_behavior(),
            "Resuming actor after unclean stop"
        );

        match state.resume_behavior() {
            ResumeBehavior::Ignore => Ok(DeliveryOutcome::ReEntered {
                state: record.state_name,
            }),
            ResumeBehavior::Retry => {
                let payload = record.payload.clone();
                self.deliver(&payload).await
            }
            ResumeBehavior::Restart => {
                let payload = record.payload.clone();
                let initial = self.graph.initial_state().to_string();
                match self
                    .store
                    .compare_and_set(&self.actor_id, record.version, &initial, &payload)
                    .await?
                {
                    Some(_) => self.deliver(&payload).await,
                    None => Ok(DeliveryOutcome::Conflict),
                }
            }
            ResumeBehavior::Error => {
                let diagnostic = json!({
                    DIAGNOSTIC_CAUSE_KEY: format!(
                        "process restarted mid-action in state {}",
                        record.state_name
                    )
                });
                self.apply(
                    record,
                    StateTransition::advance(state_names::ERROR, diagnostic),
                )
                .await
            }
        }
    }

    /// Persist an advance and derive the outbound continuation message.
    /// The persist happens first; only then is an outbound message produced.
    async fn apply(
        &self,
        record: PersistedActorState,
        transition: StateTransition,
    ) -> ActorResult<DeliveryOutcome> {
        let StateTransition::Advance { state: target, payload } = transition else {
            // apply() is only called with Advance; Halt is rewritten upstream
            return Err(ActorError::contract_violation(
                "apply() invoked with a halt transition",
            ));
        };

        let target_state = self
            .graph
            .resolve(&target)
            .ok_or_else(|| ActorError::unknown_state(&self.actor_id, &target))?;

        let Some(persisted) = self
            .store
            .compare_and_set(&self.actor_id, record.version, &target, &payload)
            .await?
        else {
            warn!(
                actor_id = %self.actor_id,
                from = %record.state_name,
                to = %target,
                "Concurrent update detected; dropping delivery"
            );
            return Ok(DeliveryOutcome::Conflict);
        };

        debug!(
            actor_id = %self.actor_id,
            from = %record.state_name,
            to = %target,
            version = persisted.version,
            "Actor transition persisted"
        );

        let terminal = target_state.is_final();
        let outbound = if !terminal && !is_suspension_point(&target) {
            Some(ActorMessage::new(self.actor_id.clone(), persisted.payload))
        } else {
            None
        };

        Ok(DeliveryOutcome::Advanced {
            state: target,
            terminal,
            outbound,
        })
    }
}
