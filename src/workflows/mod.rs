// Concrete state graphs for the actor catalogue.
//
// The states here own the control-plane side of each stage: validate the
// request payload, hand it to the worker pool through the dispatch seam, and
// park in a WAIT state until the correlated reply arrives. The actual
// fetch/convert/load business logic lives in the worker processes.

pub mod convert;
pub mod crawl;
pub mod load;
pub mod monitor;
pub mod task;

pub use convert::convert_graph;
pub use crawl::crawl_graph;
pub use load::load_graph;
pub use monitor::monitor_graph;
pub use task::task_graph;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::actor::errors::ActorResult;

/// Seam between workflow states and the worker pool: handing a request over
/// the queue to whichever process executes the stage.
///
/// Implementations must be idempotent keyed on the `request_id` carried in
/// the payload; the control plane may redo a dispatch after a crash.
#[async_trait]
pub trait WorkerDispatch: Send + Sync {
    async fn dispatch(&self, stage: &str, payload: &Value) -> ActorResult<()>;
}

/// Dispatcher that only logs, for wiring the control plane without workers
#[derive(Debug, Default)]
pub struct LoggingWorkerDispatch;

#[async_trait]
impl WorkerDispatch for LoggingWorkerDispatch {
    async fn dispatch(&self, stage: &str, payload: &Value) -> ActorResult<()> {
        info!(stage = %stage, payload = %payload, "Dispatching stage request to worker pool");
        Ok(())
    }
}
