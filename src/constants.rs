//! # System Constants
//!
//! Reserved state names, identifier conventions, and naming rules that define
//! the operational boundaries of the pipeline control plane.

/// Reserved state names shared by every actor's state graph
pub mod state_names {
    /// Designated entry state for every workflow
    pub const INITIAL: &str = "INITIAL";

    /// Well-known terminal failure state
    pub const ERROR: &str = "ERROR";

    /// Terminal success state
    pub const END: &str = "END";

    /// Self-looping state of daemon (monitor) actors
    pub const MONITOR: &str = "MONITOR";

    /// States suffixed with this are durably suspended awaiting a worker reply
    pub const WAIT_SUFFIX: &str = "WAIT";

    /// States suffixed with this are durably suspended awaiting a correlated reply
    pub const REPLY_SUFFIX: &str = "REPLY";
}

/// Actor identifier conventions
pub mod actor_ids {
    /// Stable prefix prepended to the lower-cased symbolic name
    pub const ID_PREFIX: &str = "actor:";

    /// Symbolic-name prefixes that mark an actor as a daemon
    pub const DAEMON_PREFIXES: &[&str] = &["PROC_", "MONITOR_"];

    /// Symbolic-name suffix that marks a monitor daemon
    pub const DAEMON_SUFFIX: &str = "_MONITOR";
}

/// Key under which a diagnostic failure cause is stored in an ERROR payload
pub const DIAGNOSTIC_CAUSE_KEY: &str = "cause";

/// Payload marker for an operator-initiated abort message
pub const ABORT_MARKER: &str = "ABORT";

/// Returns true when an actor parked in `state_name` is durably suspended and
/// must wait for an external message rather than driving itself forward.
///
/// Final states are suspension points too, but callers are expected to check
/// `is_final()` on the state itself; this helper only inspects the name.
pub fn is_suspension_point(state_name: &str) -> bool {
    state_name == state_names::MONITOR
        || state_name.ends_with(state_names::WAIT_SUFFIX)
        || state_name.ends_with(state_names::REPLY_SUFFIX)
}
