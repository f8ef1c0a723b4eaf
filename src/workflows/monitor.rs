//! # Monitor Workflow
//!
//! Daemon graph shared by all monitor actors: INITIAL -> MONITOR, where
//! MONITOR loops on itself for every poll tick. Monitors never reach a
//! terminal state naturally; when one fails, the control plane resets it to
//! INITIAL instead of leaving it dead.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::actor::errors::ActorResult;
use crate::actor::graph::StateGraph;
use crate::actor::state::{MachineState, ResumeBehavior};
use crate::actor::transition::StateTransition;
use crate::constants::state_names;
use crate::messaging::message::is_abort;

use super::WorkerDispatch;

struct MonitorInitial;

#[async_trait]
impl MachineState for MonitorInitial {
    fn name(&self) -> &str {
        state_names::INITIAL
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Restart
    }

    async fn next(&self, message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        Ok(StateTransition::advance(
            state_names::MONITOR,
            message.clone(),
        ))
    }
}

/// Watching state: each delivered tick runs one probe of the monitored
/// resource and re-enters MONITOR
struct MonitorState {
    stage: String,
    dispatch: Arc<dyn WorkerDispatch>,
}

#[async_trait]
impl MachineState for MonitorState {
    fn name(&self) -> &str {
        state_names::MONITOR
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Ignore
    }

    async fn next(&self, message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        self.dispatch.dispatch(&self.stage, message).await?;
        Ok(StateTransition::advance(
            state_names::MONITOR,
            message.clone(),
        ))
    }
}

/// Build a monitor daemon graph probing the given stage
pub fn monitor_graph(
    stage: impl Into<String>,
    dispatch: Arc<dyn WorkerDispatch>,
) -> ActorResult<StateGraph> {
    StateGraph::builder(state_names::INITIAL)
        .state(Arc::new(MonitorInitial))
        .state(Arc::new(MonitorState {
            stage: stage.into(),
            dispatch,
        }))
        .build()
}
