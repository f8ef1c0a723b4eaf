//! # State Graphs
//!
//! A state graph is the static description of one actor template: the full
//! set of named states plus the designated initial state. Graphs are built
//! once at startup; an unknown state name at build or resolve time is a fatal
//! configuration error, never a runtime retry.

use std::collections::HashMap;
use std::sync::Arc;

use super::errors::{ActorError, ActorResult};
use super::state::{EndState, ErrorState, MachineState};
use crate::constants::state_names;

/// Immutable name -> state mapping for one actor template
#[derive(Clone)]
pub struct StateGraph {
    states: HashMap<String, Arc<dyn MachineState>>,
    initial: String,
}

impl StateGraph {
    /// Start building a graph whose entry point is `initial`. The shared
    /// terminal states END and ERROR are pre-registered.
    pub fn builder(initial: impl Into<String>) -> StateGraphBuilder {
        StateGraphBuilder::new(initial)
    }

    /// Name of the designated entry state
    pub fn initial_state(&self) -> &str {
        &self.initial
    }

    /// Resolve a state implementation by its persisted name
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn MachineState>> {
        self.states.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// All registered state names, in no particular order
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for StateGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateGraph")
            .field("initial", &self.initial)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder validating the graph's structural invariants at construction
pub struct StateGraphBuilder {
    states: HashMap<String, Arc<dyn MachineState>>,
    initial: String,
    duplicate: Option<String>,
}

impl StateGraphBuilder {
    fn new(initial: impl Into<String>) -> Self {
        let mut states: HashMap<String, Arc<dyn MachineState>> = HashMap::new();
        states.insert(state_names::END.to_string(), Arc::new(EndState));
        states.insert(state_names::ERROR.to_string(), Arc::new(ErrorState));
        Self {
            states,
            initial: initial.into(),
            duplicate: None,
        }
    }

    /// Register a state. Reusing a name (including END and ERROR) is a
    /// contract violation reported at `build`.
    pub fn state(mut self, state: Arc<dyn MachineState>) -> Self {
        let name = state.name().to_string();
        if self.states.insert(name.clone(), state).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        self
    }

    pub fn build(self) -> ActorResult<StateGraph> {
        if let Some(name) = self.duplicate {
            return Err(ActorError::contract_violation(format!(
                "duplicate state name '{name}' in graph"
            )));
        }
        if !self.states.contains_key(&self.initial) {
            return Err(ActorError::contract_violation(format!(
                "initial state '{}' is not registered in graph",
                self.initial
            )));
        }
        Ok(StateGraph {
            states: self.states,
            initial: self.initial,
        })
    }
}
