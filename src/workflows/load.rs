//! # Load Workflow
//!
//! State graph for the RECONVERT_LOAD actor: INITIAL -> LOAD -> LOAD_WAIT ->
//! END. Feeds an ordered list of processed data sets to the loader worker
//! pool for index construction.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::actor::errors::{jump, ActorResult};
use crate::actor::graph::StateGraph;
use crate::actor::state::{MachineState, ResumeBehavior};
use crate::actor::transition::StateTransition;
use crate::constants::{state_names, DIAGNOSTIC_CAUSE_KEY};
use crate::messaging::contracts::{LoadRequest, WorkerReply};
use crate::messaging::message::is_abort;

use super::WorkerDispatch;

pub const LOAD: &str = "LOAD";
pub const LOAD_WAIT: &str = "LOAD_WAIT";

const LOADER_STAGE: &str = "loader";

struct LoadInitial;

#[async_trait]
impl MachineState for LoadInitial {
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
        let request: LoadRequest = serde_json::from_value(message.clone())?;
        if request.input_handles.is_empty() {
            // Short-circuit from inside the validation step
            return jump(
                state_names::ERROR,
                json!({ DIAGNOSTIC_CAUSE_KEY: "load request has no input data" }),
            );
        }
        Ok(StateTransition::advance(LOAD, message.clone()))
    }
}

struct LoadDispatch {
    dispatch: Arc<dyn WorkerDispatch>,
}

#[async_trait]
impl MachineState for LoadDispatch {
    fn name(&self) -> &str {
        LOAD
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Retry
    }

    async fn next(&self, message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        let _request: LoadRequest = serde_json::from_value(message.clone())?;
        self.dispatch.dispatch(LOADER_STAGE, message).await?;
        Ok(StateTransition::advance(LOAD_WAIT, message.clone()))
    }
}

struct LoadWait;

#[async_trait]
impl MachineState for LoadWait {
    fn name(&self) -> &str {
        LOAD_WAIT
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Ignore
    }

    async fn next(&self, message: &Value, pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        // Tolerate a redelivered copy of the already-applied start request
        if serde_json::from_value::<LoadRequest>(message.clone()).is_ok() {
            debug!("Redelivered load request while waiting; re-entering wait");
            return Ok(StateTransition::advance(LOAD_WAIT, pending.clone()));
        }
        let reply: WorkerReply = serde_json::from_value(message.clone())?;
        let request: LoadRequest = serde_json::from_value(pending.clone())?;
        if reply.request_id != request.request_id {
            warn!(
                expected = %request.request_id,
                received = %reply.request_id,
                "Ignoring uncorrelated loader reply"
            );
            return Ok(StateTransition::advance(LOAD_WAIT, pending.clone()));
        }
        if reply.ok {
            Ok(StateTransition::to_end())
        } else {
            Ok(StateTransition::to_error(
                reply.error.unwrap_or_else(|| "load failed".to_string()),
            ))
        }
    }
}

/// Build the load state graph
pub fn load_graph(dispatch: Arc<dyn WorkerDispatch>) -> ActorResult<StateGraph> {
    StateGraph::builder(state_names::INITIAL)
        .state(Arc::new(LoadInitial))
        .state(Arc::new(LoadDispatch { dispatch }))
        .state(Arc::new(LoadWait))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::errors::ActorError;
    use crate::messaging::contracts::StorageHandle;

    #[tokio::test]
    async fn test_empty_load_request_jumps_to_error() {
        let request = LoadRequest::new(vec![]);
        let payload = serde_json::to_value(&request).unwrap();

        match LoadInitial.next(&payload, &Value::Null).await {
            Err(ActorError::Jump { state, payload }) => {
                assert_eq!(state, state_names::ERROR);
                assert_eq!(payload[DIAGNOSTIC_CAUSE_KEY], "load request has no input data");
            }
            other => panic!("expected jump to ERROR, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ordered_handles_flow_through() {
        let request = LoadRequest::new(vec![StorageHandle(5), StorageHandle(2)]);
        let payload = serde_json::to_value(&request).unwrap();

        let transition = LoadInitial.next(&payload, &Value::Null).await.unwrap();
        match transition {
            StateTransition::Advance { state, payload } => {
                assert_eq!(state, LOAD);
                let carried: LoadRequest = serde_json::from_value(payload).unwrap();
                assert_eq!(
                    carried.input_handles,
                    vec![StorageHandle(5), StorageHandle(2)]
                );
            }
            StateTransition::Halt => panic!("expected advance"),
        }
    }

    #[tokio::test]
    async fn test_wait_requires_correlated_reply() {
        let request = LoadRequest::new(vec![StorageHandle(5)]);
        let pending = serde_json::to_value(&request).unwrap();

        // Duplicate start request and foreign reply both re-enter the wait
        let transition = LoadWait.next(&pending, &pending).await.unwrap();
        assert_eq!(transition.target(), Some(LOAD_WAIT));

        let stale = WorkerReply::failure(uuid::Uuid::new_v4(), "not ours")
            .to_json()
            .unwrap();
        let transition = LoadWait.next(&stale, &pending).await.unwrap();
        assert_eq!(transition.target(), Some(LOAD_WAIT));

        let reply = WorkerReply::success(request.request_id).to_json().unwrap();
        let transition = LoadWait.next(&reply, &pending).await.unwrap();
        assert_eq!(transition.target(), Some(state_names::END));
    }
}
