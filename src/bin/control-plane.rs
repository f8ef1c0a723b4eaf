//! Demo control-plane host: wires the default actor catalogue to the
//! in-memory transport, drives a crawl through its WAIT state, and prints the
//! projected run states.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use pipeline_core::actor::InMemoryActorStateStore;
use pipeline_core::control_plane::ControlPlane;
use pipeline_core::logging::init_structured_logging;
use pipeline_core::messaging::{
    ActorMessage, CrawlRequest, InMemoryQueueTransport, StorageHandle, WorkerReply,
};
use pipeline_core::registry::{ActorRegistry, WorkflowActor};
use pipeline_core::workflows::LoggingWorkerDispatch;
use pipeline_core::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(?config, "Starting control plane");

    let registry = Arc::new(
        ActorRegistry::with_default_catalogue(Arc::new(LoggingWorkerDispatch))
            .context("Failed to build actor catalogue")?,
    );
    let transport = Arc::new(InMemoryQueueTransport::new());
    let plane = ControlPlane::new(
        registry,
        Arc::new(InMemoryActorStateStore::new()),
        transport.clone(),
    );

    if config.resume_on_startup {
        plane.resume_all().await.context("Resume failed")?;
    }

    // Kick off a crawl and tick one monitor
    let request = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
    let request_id = request.request_id;
    plane
        .send(ActorMessage::new(
            WorkflowActor::Crawl.id(),
            serde_json::to_value(&request)?,
        ))
        .await?;
    plane
        .send(ActorMessage::new(
            WorkflowActor::LoaderMonitor.id(),
            Value::Null,
        ))
        .await?;

    // Drain what is queued so far, then answer the crawl's WAIT state with a
    // worker reply and drain again
    while let Some(message) = transport.try_receive().await? {
        plane.dispatch(message).await?;
    }
    plane
        .send(ActorMessage::new(
            WorkflowActor::Crawl.id(),
            WorkerReply::success(request_id).to_json()?,
        ))
        .await?;
    while let Some(message) = transport.try_receive().await? {
        plane.dispatch(message).await?;
    }

    for run_state in plane.run_states().await? {
        tracing::info!(
            name = %run_state.name,
            state = %run_state.state,
            status = ?run_state.status,
            terminal = run_state.terminal,
            daemon = run_state.is_daemon,
            "actor"
        );
    }
    tracing::info!(stats = ?plane.stats(), "Control plane finished");

    Ok(())
}
