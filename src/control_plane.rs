//! # Control Plane
//!
//! The owning process for every actor's persisted state. Serializes message
//! processing per actor id while letting distinct actors run concurrently,
//! applies the resume policy to the whole catalogue at startup, and restarts
//! daemon actors that fail instead of leaving them terminal.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::try_join_all;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::actor::errors::{ActorError, ActorResult};
use crate::actor::machine::{DeliveryOutcome, StateMachine};
use crate::actor::persistence::ActorStateStore;
use crate::messaging::message::ActorMessage;
use crate::messaging::transport::QueueTransport;
use crate::observability::ActorRunState;
use crate::registry::actor_registry::ActorRegistry;

/// Counters describing what the control plane has done since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlPlaneStats {
    pub dispatched: u64,
    pub conflicts: u64,
    pub dropped: u64,
    pub daemons_restarted: u64,
    pub actors_aborted: u64,
}

/// Control-plane process driving the registered actor catalogue
pub struct ControlPlane {
    registry: Arc<ActorRegistry>,
    store: Arc<dyn ActorStateStore>,
    transport: Arc<dyn QueueTransport>,
    /// Per-actor machines behind per-actor locks: at most one message is
    /// processed at a time per actor id
    machines: DashMap<String, Arc<Mutex<StateMachine>>>,
    stats: RwLock<ControlPlaneStats>,
}

impl ControlPlane {
    pub fn new(
        registry: Arc<ActorRegistry>,
        store: Arc<dyn ActorStateStore>,
        transport: Arc<dyn QueueTransport>,
    ) -> Self {
        Self {
            registry,
            store,
            transport,
            machines: DashMap::new(),
            stats: RwLock::new(ControlPlaneStats::default()),
        }
    }

    pub fn stats(&self) -> ControlPlaneStats {
        *self.stats.read()
    }

    /// Enqueue a message for an actor; delivery happens through the pump
    pub async fn send(&self, message: ActorMessage) -> ActorResult<()> {
        self.transport.send(message).await
    }

    fn machine_for(&self, actor_id: &str) -> ActorResult<Arc<Mutex<StateMachine>>> {
        let actor = self
            .registry
            .get(actor_id)
            .ok_or_else(|| ActorError::unknown_actor(actor_id))?;

        let machine = self
            .machines
            .entry(actor_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(StateMachine::new(
                    actor_id,
                    actor.graph.clone(),
                    self.store.clone(),
                )))
            })
            .clone();
        Ok(machine)
    }

    /// Deliver one message to its actor, forwarding any continuation message
    /// once the new state is persisted
    pub async fn dispatch(&self, message: ActorMessage) -> ActorResult<DeliveryOutcome> {
        let machine = self.machine_for(&message.actor_id)?;
        let machine = machine.lock().await;

        let outcome = machine.deliver(&message.payload).await?;
        self.stats.write().dispatched += 1;
        self.finish(&message.actor_id, &outcome).await?;
        Ok(outcome)
    }

    /// Apply the resume policy to every registered actor, in catalogue order.
    /// Called once after process startup.
    pub async fn resume_all(&self) -> ActorResult<Vec<(String, DeliveryOutcome)>> {
        let mut outcomes = Vec::new();
        for actor in self.registry.actors() {
            let machine = self.machine_for(&actor.id)?;
            let machine = machine.lock().await;
            let outcome = machine.resume().await?;
            self.finish(&actor.id, &outcome).await?;
            outcomes.push((actor.id.clone(), outcome));
        }
        info!(actors = outcomes.len(), "Resumed actor catalogue");
        Ok(outcomes)
    }

    /// Pump messages until the transport is closed and drained. Fatal actor
    /// errors abort the affected actor but keep the pump alive.
    pub async fn run(&self) -> ActorResult<()> {
        while let Some(message) = self.transport.receive().await? {
            let actor_id = message.actor_id.clone();
            match self.dispatch(message).await {
                Ok(_) => {}
                Err(ActorError::UnknownActor { actor_id }) => {
                    warn!(actor_id = %actor_id, "Dropping message for unknown actor");
                    self.stats.write().dropped += 1;
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        actor_id = %actor_id,
                        error = %e,
                        "Fatal actor defect; aborting actor"
                    );
                    self.stats.write().actors_aborted += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Project the run state of every registered actor
    pub async fn run_states(&self) -> ActorResult<Vec<ActorRunState>> {
        let loads = self.registry.actors().map(|actor| async move {
            let persisted = self.store.load(&actor.id).await?;
            Ok::<_, ActorError>(ActorRunState::project(actor, persisted.as_ref()))
        });
        let mut states = try_join_all(loads).await?;
        states.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(states)
    }

    /// Post-transition bookkeeping: send the continuation message (the new
    /// state is already persisted) and restart failed daemons
    async fn finish(&self, actor_id: &str, outcome: &DeliveryOutcome) -> ActorResult<()> {
        match outcome {
            DeliveryOutcome::Advanced {
                terminal, outbound, ..
            } => {
                if let Some(message) = outbound {
                    self.transport.send(message.clone()).await?;
                }
                if *terminal {
                    if let Some(actor) = self.registry.get(actor_id) {
                        if actor.is_daemon {
                            self.restart_daemon(actor_id).await?;
                        }
                    }
                }
            }
            DeliveryOutcome::Conflict => {
                self.stats.write().conflicts += 1;
            }
            DeliveryOutcome::ReEntered { .. }
            | DeliveryOutcome::AlreadyTerminal { .. }
            | DeliveryOutcome::Idle => {}
        }
        Ok(())
    }

    /// Daemons are never left terminal: reset the persisted record to the
    /// initial state so the next tick restarts the watch
    async fn restart_daemon(&self, actor_id: &str) -> ActorResult<()> {
        let Some(record) = self.store.load(actor_id).await? else {
            return Ok(());
        };
        let Some(actor) = self.registry.get(actor_id) else {
            return Ok(());
        };

        warn!(
            actor_id = %actor_id,
            failed_state = %record.state_name,
            "Daemon actor reached terminal state; restarting"
        );

        if self
            .store
            .compare_and_set(
                actor_id,
                record.version,
                actor.graph.initial_state(),
                &Value::Null,
            )
            .await?
            .is_some()
        {
            self.stats.write().daemons_restarted += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::persistence::InMemoryActorStateStore;
    use crate::messaging::transport::InMemoryQueueTransport;
    use crate::registry::catalogue::WorkflowActor;
    use crate::workflows::LoggingWorkerDispatch;

    fn control_plane() -> ControlPlane {
        let registry = Arc::new(
            ActorRegistry::with_default_catalogue(Arc::new(LoggingWorkerDispatch)).unwrap(),
        );
        ControlPlane::new(
            registry,
            Arc::new(InMemoryActorStateStore::new()),
            Arc::new(InMemoryQueueTransport::new()),
        )
    }

    #[tokio::test]
    async fn test_unknown_actor_is_rejected() {
        let plane = control_plane();
        let result = plane
            .dispatch(ActorMessage::new("actor:nonexistent", Value::Null))
            .await;
        assert!(matches!(result, Err(ActorError::UnknownActor { .. })));
    }

    #[tokio::test]
    async fn test_daemon_abort_triggers_restart() {
        let plane = control_plane();
        let monitor_id = WorkflowActor::LoaderMonitor.id();

        // Drive the daemon into MONITOR, then abort it
        plane
            .dispatch(ActorMessage::new(monitor_id.as_str(), Value::Null))
            .await
            .unwrap();
        plane
            .dispatch(ActorMessage::abort(monitor_id.as_str()))
            .await
            .unwrap();

        // The failed daemon must be back at its initial state, not dead
        let record = plane.store.load(&monitor_id).await.unwrap().unwrap();
        assert_eq!(record.state_name, "INITIAL");
        assert_eq!(plane.stats().daemons_restarted, 1);
    }

    #[tokio::test]
    async fn test_resume_all_covers_whole_catalogue() {
        let plane = control_plane();
        let outcomes = plane.resume_all().await.unwrap();
        assert_eq!(outcomes.len(), plane.registry.len());
        // Nothing has run yet, so every actor is idle
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, DeliveryOutcome::Idle)));
    }

    #[tokio::test]
    async fn test_run_states_cover_whole_catalogue() {
        let plane = control_plane();
        let states = plane.run_states().await.unwrap();
        assert_eq!(states.len(), plane.registry.len());
        assert!(states.iter().all(|s| s.can_start));
        assert!(states.iter().all(|s| !s.terminal));
    }
}
