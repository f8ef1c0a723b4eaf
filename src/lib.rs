#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pipeline Core
//!
//! Control plane for a multi-stage batch search pipeline (crawl, convert,
//! load, index, plus maintenance jobs), built on crash-recoverable actors.
//!
//! ## Overview
//!
//! Every pipeline stage is an instance of the same state-machine abstraction:
//! a named set of states whose current state and pending payload are durably
//! persisted, so a process restart (crash, redeploy, operator abort) resumes
//! exactly where the workflow left off. Worker processes that execute the
//! actual stage logic communicate with the control plane only through a
//! durable message queue.
//!
//! ## Module Organization
//!
//! - [`actor`] - State-machine engine: states, transitions, run loop, persistence
//! - [`registry`] - Static actor catalogue and startup-time registry
//! - [`workflows`] - Concrete state graphs for the catalogue's actors
//! - [`messaging`] - Message envelope, payload contracts, queue transport seam
//! - [`control_plane`] - Per-actor serialization, resume-at-startup, daemon restart
//! - [`observability`] - Read-only run-state projection for dashboards
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Recovery Model
//!
//! Transitions are persisted before any outward message is sent. A crash
//! between action completion and persistence is recovered by redoing the
//! action (actions are idempotent under the Retry resume policy); a crash
//! after persistence is recovered by resuming in the new state and re-deriving
//! the outbound message deterministically from (state, payload).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pipeline_core::actor::InMemoryActorStateStore;
//! use pipeline_core::control_plane::ControlPlane;
//! use pipeline_core::messaging::{ActorMessage, CrawlRequest, InMemoryQueueTransport, StorageHandle};
//! use pipeline_core::registry::{ActorRegistry, WorkflowActor};
//! use pipeline_core::workflows::LoggingWorkerDispatch;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ActorRegistry::with_default_catalogue(
//!     Arc::new(LoggingWorkerDispatch),
//! )?);
//! let plane = ControlPlane::new(
//!     registry,
//!     Arc::new(InMemoryActorStateStore::new()),
//!     Arc::new(InMemoryQueueTransport::new()),
//! );
//!
//! plane.resume_all().await?;
//!
//! let request = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
//! plane
//!     .send(ActorMessage::new(
//!         WorkflowActor::Crawl.id(),
//!         serde_json::to_value(&request)?,
//!     ))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod constants;
pub mod control_plane;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod observability;
pub mod registry;
pub mod workflows;

pub use actor::{
    ActorError, ActorResult, ActorStateStore, DeliveryOutcome, InMemoryActorStateStore,
    MachineState, PersistedActorState, PgActorStateStore, ResumeBehavior, StateGraph,
    StateMachine, StateTransition,
};
pub use config::PipelineConfig;
pub use control_plane::{ControlPlane, ControlPlaneStats};
pub use error::{PipelineError, Result};
pub use messaging::{ActorMessage, QueueTransport, StorageHandle};
pub use observability::{ActorRunState, RunStatus};
pub use registry::{ActorRegistry, ControlActor, WorkflowActor};
