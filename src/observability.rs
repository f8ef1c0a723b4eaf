//! # Run State Projection
//!
//! Observer-facing status derived on demand from an actor's persisted state.
//! This is a read-only projection for dashboards and CLIs; it never exposes
//! transition logic and is never persisted itself. The classification must be
//! total over every reachable state name, so anything unrecognized falls into
//! the Running default.

use serde::{Deserialize, Serialize};

use crate::actor::persistence::PersistedActorState;
use crate::constants::{state_names, DIAGNOSTIC_CAUSE_KEY};
use crate::registry::actor_registry::RegisteredActor;

/// Coarse status classification of one actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Terminal: finished or failed
    Dead,
    /// Daemon parked in its MONITOR state
    Watching,
    /// Durably suspended awaiting a worker reply
    Waiting,
    /// Anything else
    Running,
}

impl RunStatus {
    /// Classify a raw internal state name. Purely cosmetic, so unknown names
    /// default to Running rather than failing.
    pub fn classify(state_name: &str, terminal: bool) -> Self {
        if terminal {
            Self::Dead
        } else if state_name == state_names::MONITOR {
            Self::Watching
        } else if state_name.ends_with(state_names::WAIT_SUFFIX)
            || state_name.ends_with(state_names::REPLY_SUFFIX)
        {
            Self::Waiting
        } else {
            Self::Running
        }
    }

    /// Stable icon class for rendering layers
    pub fn icon_class(&self) -> &'static str {
        match self {
            Self::Dead => "status-dead",
            Self::Watching => "status-watching",
            Self::Waiting => "status-waiting",
            Self::Running => "status-running",
        }
    }
}

/// Read-only projection of one actor's health for the observability surface
#[derive(Debug, Clone, Serialize)]
pub struct ActorRunState {
    /// Symbolic catalogue name
    pub name: String,
    /// Current persisted state name (INITIAL when the actor has never run)
    pub state: String,
    pub actor_description: String,
    /// Failure cause when the actor sits in ERROR
    pub state_description: Option<String>,
    pub terminal: bool,
    pub can_start: bool,
    /// Derived from the naming convention, first-class in the projection
    pub is_daemon: bool,
    pub status: RunStatus,
}

impl ActorRunState {
    /// Project the registered actor's current persisted record. A missing
    /// record means the actor was registered but never driven.
    pub fn project(actor: &RegisteredActor, persisted: Option<&PersistedActorState>) -> Self {
        let state = persisted
            .map(|r| r.state_name.clone())
            .unwrap_or_else(|| actor.graph.initial_state().to_string());

        let terminal = actor
            .graph
            .resolve(&state)
            .map(|s| s.is_final())
            .unwrap_or(false);

        let state_description = persisted.and_then(|r| {
            r.payload
                .get(DIAGNOSTIC_CAUSE_KEY)
                .and_then(|cause| cause.as_str())
                .map(String::from)
        });

        let can_start =
            persisted.is_none() || terminal || state == actor.graph.initial_state();

        Self {
            name: actor.name.clone(),
            state: state.clone(),
            actor_description: actor.description.clone(),
            state_description,
            terminal,
            can_start,
            is_daemon: actor.is_daemon,
            status: RunStatus::classify(&state, terminal),
        }
    }
}
