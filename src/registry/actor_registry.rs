//! # Actor Registry
//!
//! The registry binds the static catalogue to concrete state graphs. It is
//! constructed once at control-plane startup and passed by reference to the
//! run loop and the observability surface; tests may build synthetic
//! registries with their own graphs.

use std::collections::HashMap;
use std::sync::Arc;

use crate::actor::errors::{ActorError, ActorResult};
use crate::actor::graph::StateGraph;
use crate::workflows::{
    convert_graph, crawl_graph, load_graph, monitor_graph, task_graph, WorkerDispatch,
};

use super::catalogue::{ControlActor, WorkflowActor};

/// One registered actor template: identity, human label, and state graph
#[derive(Clone)]
pub struct RegisteredActor {
    pub id: String,
    /// Symbolic SCREAMING_SNAKE name from the catalogue
    pub name: String,
    pub description: String,
    pub is_daemon: bool,
    pub graph: Arc<StateGraph>,
}

impl std::fmt::Debug for RegisteredActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredActor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_daemon", &self.is_daemon)
            .finish()
    }
}

/// Catalogue of registered actors, keyed by wire/storage identifier
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: HashMap<String, Arc<RegisteredActor>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor template; a duplicate id is a configuration defect
    pub fn register(&mut self, actor: RegisteredActor) -> ActorResult<()> {
        let id = actor.id.clone();
        if self.actors.insert(id.clone(), Arc::new(actor)).is_some() {
            return Err(ActorError::contract_violation(format!(
                "duplicate actor id '{id}' in registry"
            )));
        }
        Ok(())
    }

    pub fn get(&self, actor_id: &str) -> Option<Arc<RegisteredActor>> {
        self.actors.get(actor_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Arc<RegisteredActor>> {
        self.actors.values()
    }

    /// Build the full production catalogue: every workflow actor and every
    /// control-plane meta-actor, wired to the given worker dispatch seam
    pub fn with_default_catalogue(dispatch: Arc<dyn WorkerDispatch>) -> ActorResult<Self> {
        let mut registry = Self::new();

        for actor in WorkflowActor::ALL {
            let graph = graph_for_workflow(*actor, dispatch.clone())?;
            registry.register(RegisteredActor {
                id: actor.id(),
                name: actor.as_str().to_string(),
                description: actor.description().to_string(),
                is_daemon: actor.is_daemon(),
                graph: Arc::new(graph),
            })?;
        }

        for actor in ControlActor::ALL {
            let stage = actor.as_str().to_lowercase();
            let graph = if actor.is_daemon() {
                monitor_graph(stage, dispatch.clone())?
            } else {
                task_graph(stage, dispatch.clone())?
            };
            registry.register(RegisteredActor {
                id: actor.id(),
                name: actor.as_str().to_string(),
                description: actor.description().to_string(),
                is_daemon: actor.is_daemon(),
                graph: Arc::new(graph),
            })?;
        }

        Ok(registry)
    }
}

fn graph_for_workflow(
    actor: WorkflowActor,
    dispatch: Arc<dyn WorkerDispatch>,
) -> ActorResult<StateGraph> {
    match actor {
        WorkflowActor::Crawl | WorkflowActor::Recrawl => crawl_graph(dispatch),
        WorkflowActor::Convert => convert_graph(dispatch),
        WorkflowActor::ReconvertLoad => load_graph(dispatch),
        daemon if daemon.is_daemon() => monitor_graph(daemon.as_str().to_lowercase(), dispatch),
        task => task_graph(task.as_str().to_lowercase(), dispatch),
    }
}
