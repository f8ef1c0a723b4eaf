//! End-to-end actor lifecycle tests: happy-path crawl through its WAIT state,
//! failure capture in ERROR, daemon watching, and crash-resume recovery.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use pipeline_core::actor::{
    ActorError, ActorResult, ActorStateStore, DeliveryOutcome, InMemoryActorStateStore,
    StateMachine,
};
use pipeline_core::control_plane::ControlPlane;
use pipeline_core::messaging::{
    ActorMessage, CrawlRequest, InMemoryQueueTransport, StorageHandle, WorkerReply,
};
use pipeline_core::observability::RunStatus;
use pipeline_core::registry::{ActorRegistry, WorkflowActor};
use pipeline_core::workflows::{crawl_graph, WorkerDispatch};

/// Records every dispatched stage request, for asserting idempotent redo
#[derive(Default)]
struct RecordingDispatch {
    calls: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl WorkerDispatch for RecordingDispatch {
    async fn dispatch(&self, stage: &str, payload: &Value) -> ActorResult<()> {
        self.calls.lock().push((stage.to_string(), payload.clone()));
        Ok(())
    }
}

/// Fails every dispatch with a transient error
struct FailingDispatch;

#[async_trait]
impl WorkerDispatch for FailingDispatch {
    async fn dispatch(&self, stage: &str, _payload: &Value) -> ActorResult<()> {
        Err(ActorError::action_failed(
            stage.to_uppercase(),
            "conversion failed",
        ))
    }
}

fn plane_with(dispatch: Arc<dyn WorkerDispatch>) -> (ControlPlane, Arc<InMemoryQueueTransport>) {
    let registry = Arc::new(ActorRegistry::with_default_catalogue(dispatch).unwrap());
    let transport = Arc::new(InMemoryQueueTransport::new());
    let plane = ControlPlane::new(
        registry,
        Arc::new(InMemoryActorStateStore::new()),
        transport.clone(),
    );
    (plane, transport)
}

async fn drain(plane: &ControlPlane, transport: &InMemoryQueueTransport) {
    while let Some(message) = transport.try_receive().await.unwrap() {
        plane.dispatch(message).await.unwrap();
    }
}

fn run_state_of(states: &[pipeline_core::ActorRunState], name: &str) -> pipeline_core::ActorRunState {
    states.iter().find(|s| s.name == name).unwrap().clone()
}

#[tokio::test]
async fn test_crawl_happy_path_reaches_terminal_end() {
    let dispatch = Arc::new(RecordingDispatch::default());
    let (plane, transport) = plane_with(dispatch.clone());
    let crawl_id = WorkflowActor::Crawl.id();

    let request = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
    let request_id = request.request_id;
    plane
        .send(ActorMessage::new(
            crawl_id.as_str(),
            serde_json::to_value(&request).unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    // The actor parked in its WAIT state after dispatching exactly one crawl
    let states = plane.run_states().await.unwrap();
    let crawl = run_state_of(&states, "CRAWL");
    assert_eq!(crawl.state, "CRAWL_WAIT");
    assert_eq!(crawl.status, RunStatus::Waiting);
    assert!(!crawl.terminal);
    assert_eq!(dispatch.calls.lock().len(), 1);

    // Correlated worker reply completes the workflow
    plane
        .send(ActorMessage::new(
            crawl_id.as_str(),
            WorkerReply::success(request_id).to_json().unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    let crawl = run_state_of(&states, "CRAWL");
    assert_eq!(crawl.state, "END");
    assert!(crawl.terminal);
    assert_eq!(crawl.status, RunStatus::Dead);
}

#[tokio::test]
async fn test_convert_failure_lands_in_error_with_cause() {
    let (plane, transport) = plane_with(Arc::new(FailingDispatch));
    let convert_id = WorkflowActor::Convert.id();

    let request = pipeline_core::messaging::ConvertRequest::new(StorageHandle(3), StorageHandle(4));
    plane
        .send(ActorMessage::new(
            convert_id.as_str(),
            serde_json::to_value(&request).unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    let convert = run_state_of(&states, "CONVERT");
    assert_eq!(convert.state, "ERROR");
    assert!(convert.terminal);
    assert_eq!(convert.status, RunStatus::Dead);
    assert!(convert
        .state_description
        .as_deref()
        .unwrap()
        .contains("conversion failed"));
}

#[tokio::test]
async fn test_loader_monitor_reports_watching() {
    let (plane, transport) = plane_with(Arc::new(RecordingDispatch::default()));
    let monitor_id = WorkflowActor::LoaderMonitor.id();

    plane
        .send(ActorMessage::new(monitor_id.as_str(), Value::Null))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    let monitor = run_state_of(&states, "LOADER_MONITOR");
    assert_eq!(monitor.state, "MONITOR");
    assert_eq!(monitor.status, RunStatus::Watching);
    assert!(!monitor.terminal);
    assert!(monitor.is_daemon);

    // Further ticks keep it watching
    plane
        .send(ActorMessage::new(monitor_id.as_str(), Value::Null))
        .await
        .unwrap();
    drain(&plane, &transport).await;
    let states = plane.run_states().await.unwrap();
    assert_eq!(run_state_of(&states, "LOADER_MONITOR").status, RunStatus::Watching);
}

#[tokio::test]
async fn test_resume_retry_matches_uninterrupted_run() {
    // Two identical actors over separate stores: one runs cleanly, the other
    // simulates a crash after the action completed but before persistence
    // (the store still holds the pre-action record) and is resumed.
    let request = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
    let payload = serde_json::to_value(&request).unwrap();

    let clean_dispatch = Arc::new(RecordingDispatch::default());
    let clean_store = Arc::new(InMemoryActorStateStore::new());
    let clean_graph = Arc::new(crawl_graph(clean_dispatch.clone()).unwrap());
    let clean = StateMachine::new("actor:crawl", clean_graph, clean_store.clone());

    clean_store
        .create_if_absent("actor:crawl", "CRAWL", &payload)
        .await
        .unwrap();
    let clean_outcome = clean.deliver(&payload).await.unwrap();

    let crashed_dispatch = Arc::new(RecordingDispatch::default());
    let crashed_store = Arc::new(InMemoryActorStateStore::new());
    let crashed_graph = Arc::new(crawl_graph(crashed_dispatch.clone()).unwrap());
    let crashed = StateMachine::new("actor:crawl", crashed_graph, crashed_store.clone());

    // Pre-crash: the action ran (one dispatch) but nothing was persisted
    crashed_store
        .create_if_absent("actor:crawl", "CRAWL", &payload)
        .await
        .unwrap();
    crashed_dispatch
        .dispatch("crawler", &payload)
        .await
        .unwrap();

    // CRAWL's resume policy is Retry: redo the action with the same payload
    let resumed_outcome = crashed.resume().await.unwrap();

    match (&clean_outcome, &resumed_outcome) {
        (
            DeliveryOutcome::Advanced { state: clean_state, .. },
            DeliveryOutcome::Advanced { state: resumed_state, .. },
        ) => {
            assert_eq!(clean_state, resumed_state);
            assert_eq!(clean_state, "CRAWL_WAIT");
        }
        other => panic!("expected both runs to advance, got {other:?}"),
    }

    let clean_record = clean_store.load("actor:crawl").await.unwrap().unwrap();
    let crashed_record = crashed_store.load("actor:crawl").await.unwrap().unwrap();
    assert_eq!(clean_record.state_name, crashed_record.state_name);
    assert_eq!(clean_record.payload, crashed_record.payload);

    // The worker saw the request twice on the crashed path; the request_id
    // inside the payload is what makes that redo safe
    assert_eq!(clean_dispatch.calls.lock().len(), 1);
    assert_eq!(crashed_dispatch.calls.lock().len(), 2);
    let calls = crashed_dispatch.calls.lock();
    assert_eq!(calls[0].1, calls[1].1);
}

#[tokio::test]
async fn test_redelivered_start_request_leaves_wait_intact() {
    let dispatch = Arc::new(RecordingDispatch::default());
    let (plane, transport) = plane_with(dispatch.clone());
    let crawl_id = WorkflowActor::Crawl.id();

    let request = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
    let payload = serde_json::to_value(&request).unwrap();
    plane
        .send(ActorMessage::new(crawl_id.as_str(), payload.clone()))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    // At-least-once delivery hands the identical start message over again
    // while the actor is parked in its WAIT state
    plane
        .send(ActorMessage::new(crawl_id.as_str(), payload))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    let crawl = run_state_of(&states, "CRAWL");
    assert_eq!(crawl.state, "CRAWL_WAIT");
    assert_eq!(crawl.status, RunStatus::Waiting);
    assert!(!crawl.terminal);
    // The duplicate must not have re-run the crawl action
    assert_eq!(dispatch.calls.lock().len(), 1);

    // The correlated reply still completes the workflow afterwards
    plane
        .send(ActorMessage::new(
            crawl_id.as_str(),
            WorkerReply::success(request.request_id).to_json().unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    assert_eq!(run_state_of(&states, "CRAWL").state, "END");
}

#[tokio::test]
async fn test_uncorrelated_reply_does_not_complete_wait() {
    let (plane, transport) = plane_with(Arc::new(RecordingDispatch::default()));
    let crawl_id = WorkflowActor::Crawl.id();

    let request = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
    plane
        .send(ActorMessage::new(
            crawl_id.as_str(),
            serde_json::to_value(&request).unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    // A reply for some other request must not finish this workflow
    let foreign = WorkerReply::failure(uuid::Uuid::new_v4(), "someone else's crawl")
        .to_json()
        .unwrap();
    plane
        .send(ActorMessage::new(crawl_id.as_str(), foreign))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    let crawl = run_state_of(&states, "CRAWL");
    assert_eq!(crawl.state, "CRAWL_WAIT");
    assert_eq!(crawl.status, RunStatus::Waiting);

    plane
        .send(ActorMessage::new(
            crawl_id.as_str(),
            WorkerReply::success(request.request_id).to_json().unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    assert_eq!(run_state_of(&states, "CRAWL").state, "END");
}

#[tokio::test]
async fn test_operator_abort_is_an_ordinary_message() {
    let (plane, transport) = plane_with(Arc::new(RecordingDispatch::default()));
    let crawl_id = WorkflowActor::Crawl.id();

    let request = CrawlRequest::new(StorageHandle(1), StorageHandle(2));
    plane
        .send(ActorMessage::new(
            crawl_id.as_str(),
            serde_json::to_value(&request).unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    // Abort while parked in CRAWL_WAIT
    plane.send(ActorMessage::abort(crawl_id.as_str())).await.unwrap();
    drain(&plane, &transport).await;

    let states = plane.run_states().await.unwrap();
    let crawl = run_state_of(&states, "CRAWL");
    assert_eq!(crawl.state, "ERROR");
    assert!(crawl
        .state_description
        .as_deref()
        .unwrap()
        .contains("aborted by operator"));
}

#[tokio::test]
async fn test_redelivery_to_terminal_actor_is_tolerated() {
    let (plane, transport) = plane_with(Arc::new(RecordingDispatch::default()));
    let crawl_id = WorkflowActor::Crawl.id();

    let request = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
    let reply = WorkerReply::success(request.request_id).to_json().unwrap();

    plane
        .send(ActorMessage::new(
            crawl_id.as_str(),
            serde_json::to_value(&request).unwrap(),
        ))
        .await
        .unwrap();
    drain(&plane, &transport).await;
    plane
        .send(ActorMessage::new(crawl_id.as_str(), reply.clone()))
        .await
        .unwrap();
    drain(&plane, &transport).await;

    // Redelivered reply after the actor finished: dropped, not reapplied
    let outcome = plane
        .dispatch(ActorMessage::new(crawl_id.as_str(), reply))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        DeliveryOutcome::AlreadyTerminal { ref state } if state == "END"
    ));
}
