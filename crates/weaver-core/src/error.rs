//! Unified error types for Weaver

use crate::types::TaskId;
use thiserror::Error;

/// Unified error type for all Weaver planning operations
#[derive(Error, Debug)]
pub enum WeaverError {
    /// The dependency graph contains a cycle; no valid execution order
    /// exists. Carries one concrete cycle path, first repeated node last.
    #[error("Dependency cycle detected: {}", .cycle.join(" -> "))]
    CycleDetected { cycle: Vec<TaskId> },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // I/O errors (CLI shell only - the pipeline itself does no I/O)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using WeaverError
pub type Result<T> = std::result::Result<T, WeaverError>;
