// Actor engine for crash-recoverable pipeline workflows
//
// Every pipeline stage (crawler, converter, loader, monitors, maintenance
// jobs) is an instance of the same state-machine abstraction: a named set of
// states with durable (state, payload) persistence, explicit resume policy,
// and non-local transition signaling.

pub mod errors;
pub mod graph;
pub mod machine;
pub mod persistence;
pub mod state;
pub mod transition;

// Re-export main types for convenient access
pub use errors::{jump, ActorError, ActorResult};
pub use graph::{StateGraph, StateGraphBuilder};
pub use machine::{DeliveryOutcome, StateMachine};
pub use persistence::{
    ActorStateStore, InMemoryActorStateStore, PersistedActorState, PgActorStateStore,
};
pub use state::{EndState, ErrorState, MachineState, ResumeBehavior};
pub use transition::StateTransition;
