//! # Message Envelope
//!
//! The envelope carried on the queue for every control-plane message: the
//! addressed actor id, an opaque payload blob, and delivery metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::ABORT_MARKER;

/// A queue message addressed to one actor id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorMessage {
    /// Wire/storage identifier of the addressed actor
    pub actor_id: String,
    /// Opaque payload consumed by the actor's current state
    pub payload: Value,
    /// Delivery metadata
    pub metadata: MessageMetadata,
}

/// Metadata attached to every queue message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// When the message was created
    pub created_at: DateTime<Utc>,
    /// Correlation id tying replies back to the conversation
    pub correlation_id: Option<String>,
}

impl Default for MessageMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            correlation_id: Some(Uuid::new_v4().to_string()),
        }
    }
}

impl ActorMessage {
    /// Create a new message with default metadata
    pub fn new(actor_id: impl Into<String>, payload: Value) -> Self {
        Self {
            actor_id: actor_id.into(),
            payload,
            metadata: MessageMetadata::default(),
        }
    }

    /// Create a message with explicit metadata
    pub fn with_metadata(
        actor_id: impl Into<String>,
        payload: Value,
        metadata: MessageMetadata,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            payload,
            metadata,
        }
    }

    /// Create an operator abort message. Every workflow state interprets this
    /// payload as a transition to ERROR; there is no separate interrupt path.
    pub fn abort(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, Value::String(ABORT_MARKER.to_string()))
    }

    /// Message age in milliseconds
    pub fn age_ms(&self) -> u64 {
        Utc::now()
            .signed_duration_since(self.metadata.created_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

/// Whether a payload is the reserved operator-abort marker
pub fn is_abort(payload: &Value) -> bool {
    payload.as_str() == Some(ABORT_MARKER)
}
