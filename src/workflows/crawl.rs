//! # Crawl Workflow
//!
//! State graph for the CRAWL and RECRAWL actors:
//! INITIAL -> CRAWL -> CRAWL_WAIT -> END. The CRAWL action dispatches the
//! crawl request to the crawler worker pool; CRAWL_WAIT suspends durably
//! until the correlated worker reply arrives.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::actor::errors::ActorResult;
use crate::actor::graph::StateGraph;
use crate::actor::state::{MachineState, ResumeBehavior};
use crate::actor::transition::StateTransition;
use crate::constants::state_names;
use crate::messaging::contracts::{CrawlRequest, WorkerReply};
use crate::messaging::message::is_abort;

use super::WorkerDispatch;

pub const CRAWL: &str = "CRAWL";
pub const CRAWL_WAIT: &str = "CRAWL_WAIT";

/// Queue name of the crawler worker pool
const CRAWLER_STAGE: &str = "crawler";

/// Entry state: validates the crawl request before committing to the crawl
struct CrawlInitial;

#[async_trait]
impl MachineState for CrawlInitial {
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
        // Reject malformed requests before any work is dispatched
        let _request: CrawlRequest = serde_json::from_value(message.clone())?;
        Ok(StateTransition::advance(CRAWL, message.clone()))
    }
}

/// Dispatches the crawl to the worker pool, then parks in CRAWL_WAIT.
/// Retry-safe: the request carries its own idempotency key.
struct CrawlDispatch {
    dispatch: Arc<dyn WorkerDispatch>,
}

#[async_trait]
impl MachineState for CrawlDispatch {
    fn name(&self) -> &str {
        CRAWL
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Retry
    }

    async fn next(&self, message: &Value, _pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        let _request: CrawlRequest = serde_json::from_value(message.clone())?;
        self.dispatch.dispatch(CRAWLER_STAGE, message).await?;
        Ok(StateTransition::advance(CRAWL_WAIT, message.clone()))
    }
}

/// Durable wait for the crawler's reply; nothing to redo on resume. The wait
/// completes only on a reply correlated with the pending request; duplicates
/// of the start request and stale replies re-enter the wait untouched.
struct CrawlWait;

#[async_trait]
impl MachineState for CrawlWait {
    fn name(&self) -> &str {
        CRAWL_WAIT
    }

    fn resume_behavior(&self) -> ResumeBehavior {
        ResumeBehavior::Ignore
    }

    async fn next(&self, message: &Value, pending: &Value) -> ActorResult<StateTransition> {
        if is_abort(message) {
            return Ok(StateTransition::to_error("aborted by operator"));
        }
        // At-least-once delivery: a redelivered copy of the start request
        // was already applied, so it must not be evaluated as a reply
        if serde_json::from_value::<CrawlRequest>(message.clone()).is_ok() {
            debug!("Redelivered crawl request while waiting; re-entering wait");
            return Ok(StateTransition::advance(CRAWL_WAIT, pending.clone()));
        }
        let reply: WorkerReply = serde_json::from_value(message.clone())?;
        let request: CrawlRequest = serde_json::from_value(pending.clone())?;
        if reply.request_id != request.request_id {
            warn!(
                expected = %request.request_id,
                received = %reply.request_id,
                "Ignoring uncorrelated crawler reply"
            );
            return Ok(StateTransition::advance(CRAWL_WAIT, pending.clone()));
        }
        if reply.ok {
            Ok(StateTransition::to_end())
        } else {
            Ok(StateTransition::to_error(
                reply.error.unwrap_or_else(|| "crawl failed".to_string()),
            ))
        }
    }
}

/// Build the crawl state graph
pub fn crawl_graph(dispatch: Arc<dyn WorkerDispatch>) -> ActorResult<StateGraph> {
    StateGraph::builder(state_names::INITIAL)
        .state(Arc::new(CrawlInitial))
        .state(Arc::new(CrawlDispatch { dispatch }))
        .state(Arc::new(CrawlWait))
        .build()
}
