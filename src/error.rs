//! # Top-Level Error Types
//!
//! Crate-wide error type wrapping the actor engine's error taxonomy, using
//! thiserror for structured error types instead of `Box<dyn Error>` patterns.

use thiserror::Error;

use crate::actor::errors::ActorError;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("actor error: {0}")]
    Actor(#[from] ActorError),

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("database error: {message}")]
    Database { message: String },
}

impl PipelineError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
