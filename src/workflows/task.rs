//! # Generic Task Workflow
//!
//! One-shot maintenance graph used by catalogue entries without a dedicated
//! workflow (adjacency calculation, export, truncation, reindex, rebalance):
//! INITIAL -> RUN -> END. The RUN action hands the whole payload to the
//! stage's worker and completes immediately; stages needing a reply get their
//! own graph instead.

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

pub const RUN: &str = "RUN";

struct TaskInitial;

#[async_trait]
impl MachineState for TaskInitial {
    fn name(&self) -> &str {
        state_names::INITIAL
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Retry
    }

    async fn next(&self, message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        Ok(StateTransition::advance(RUN, message.clone()))
    }
}

struct TaskRun {
    stage: String,
    dispatch: Arc<dyn WorkerDispatch>,
}

#[async_trait]
impl MachineState for TaskRun {
    fn name(&self) -> &str {
        RUN
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Retry
    }

    async fn next(&self, message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        self.dispatch.dispatch(&self.stage, message).await?;
        Ok(StateTransition::to_end())
    }
}

/// Build a one-shot task graph for the given stage
pub fn task_graph(
    stage: impl Into<String>,
    dispatch: Arc<dyn WorkerDispatch>,
) -> ActorResult<StateGraph> {
    StateGraph::builder(state_names::INITIAL)
        .state(Arc::new(TaskInitial))
        .state(Arc::new(TaskRun {
            stage: stage.into(),
            dispatch,
        }))
        .build()
}
