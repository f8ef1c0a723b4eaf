//! # Convert Workflow
//!
//! State graph for the CONVERT actor: INITIAL -> CONVERT -> CONVERT_WAIT ->
//! END. Converts a crawl data set into processed, loadable data via the
//! converter worker pool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::actor::errors::ActorResult;
use crate::actor::graph::StateGraph;
use crate::actor::state::{MachineState, ResumeBehavior};
use crate::actor::transition::StateTransition;
use crate::constants::state_names;
use crate::messaging::contracts::{ConvertRequest, WorkerReply};
use crate::messaging::message::is_abort;

use super::WorkerDispatch;

pub const CONVERT: &str = "CONVERT";
pub const CONVERT_WAIT: &str = "CONVERT_WAIT";

const CONVERTER_STAGE: &str = "converter";

struct ConvertInitial;

#[async_trait]
impl MachineState for ConvertInitial {
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
        let _request: ConvertRequest = serde_json::from_value(message.clone())?;
        Ok(StateTransition::advance(CONVERT, message.clone()))
    }
}

struct ConvertDispatch {
    dispatch: Arc<dyn WorkerDispatch>,
}

#[async_trait]
impl MachineState for ConvertDispatch {
    fn name(&self) -> &str {
        CONVERT
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Retry
    }

    async fn next(&self, message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        let _request: ConvertRequest = serde_json::from_value(message.clone())?;
        self.dispatch.dispatch(CONVERTER_STAGE, message).await?;
        Ok(StateTransition::advance(CONVERT_WAIT, message.clone()))
    }
}

struct ConvertWait;

#[async_trait]
impl MachineState for ConvertWait {
    fn name(&self) -> &str {
        CONVERT_WAIT
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Ignore
    }

    async fn next(&self, message: &Value, pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        // Tolerate a redelivered copy of the already-applied start request
        if serde_json::from_value::<ConvertRequest>(message.clone()).is_ok() {
            debug!("Redelivered convert request while waiting; re-entering wait");
            return Ok(StateTransition::advance(CONVERT_WAIT, pending.clone()));
        }
        let reply: WorkerReply = serde_json::from_value(message.clone())?;
        let request: ConvertRequest = serde_json::from_value(pending.clone())?;
        if reply.request_id != request.request_id {
            warn!(
                expected = %request.request_id,
                received = %reply.request_id,
                "Ignoring uncorrelated converter reply"
            );
            return Ok(StateTransition::advance(CONVERT_WAIT, pending.clone()));
        }
        if reply.ok {
            Ok(StateTransition::to_end())
        } else {
            Ok(StateTransition::to_error(
                reply
                    .error
                    .unwrap_or_else(|| "conversion failed".to_string()),
            ))
        }
    }
}

/// Build the convert state graph
pub fn convert_graph(dispatch: Arc<dyn WorkerDispatch>) -> ActorResult<StateGraph> {
    StateGraph::builder(state_names::INITIAL)
        .state(Arc::new(ConvertInitial))
        .state(Arc::new(ConvertDispatch { dispatch }))
        .state(Arc::new(ConvertWait))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::errors::ActorError;
    use crate::messaging::contracts::StorageHandle;

    struct FailingDispatch;

    #[async_trait]
    impl WorkerDispatch for FailingDispatch {
        async fn dispatch(&self, _stage: &str, _payload: &Value) -> ActorResult<()> {
            Err(ActorError::action_failed(CONVERT, "conversion failed"))
        }
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_recoverable() {
        let state = ConvertDispatch {
            dispatch: Arc::new(FailingDispatch),
        };
        let request = ConvertRequest::new(StorageHandle(3), StorageHandle(4));
        let payload = serde_json::to_value(&request).unwrap();

        let err = state.next(&payload, &Value::Null).await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("conversion failed"));
    }

    #[tokio::test]
    async fn test_happy_path_transitions() {
        let dispatch: Arc<dyn WorkerDispatch> = Arc::new(super::super::LoggingWorkerDispatch);
        let request = ConvertRequest::new(StorageHandle(3), StorageHandle(4));
        let payload = serde_json::to_value(&request).unwrap();

        let transition = ConvertInitial.next(&payload, &Value::Null).await.unwrap();
        assert_eq!(transition.target(), Some(CONVERT));

        let state = ConvertDispatch { dispatch };
        let transition = state.next(&payload, &Value::Null).await.unwrap();
        assert_eq!(transition.target(), Some(CONVERT_WAIT));
    }

    #[tokio::test]
    async fn test_wait_tolerates_duplicate_request_and_stale_reply() {
        let request = ConvertRequest::new(StorageHandle(3), StorageHandle(4));
        let pending = serde_json::to_value(&request).unwrap();

        let transition = ConvertWait.next(&pending, &pending).await.unwrap();
        assert_eq!(transition.target(), Some(CONVERT_WAIT));

        let stale = WorkerReply::success(uuid::Uuid::new_v4()).to_json().unwrap();
        let transition = ConvertWait.next(&stale, &pending).await.unwrap();
        assert_eq!(transition.target(), Some(CONVERT_WAIT));

        let reply = WorkerReply::success(request.request_id).to_json().unwrap();
        let transition = ConvertWait.next(&reply, &pending).await.unwrap();
        assert_eq!(transition.target(), Some(state_names::END));
    }
}
