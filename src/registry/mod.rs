// Static actor catalogue and the startup-time registry binding it to graphs.

pub mod actor_registry;
pub mod catalogue;

pub use actor_registry::{ActorRegistry, RegisteredActor};
pub use catalogue::{actor_id_for, is_daemon_name, ControlActor, WorkflowActor};
