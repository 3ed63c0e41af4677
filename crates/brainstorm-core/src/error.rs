//! Error types for the Brainstorm core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Brainstorm workspace.
///
/// Generator-side failures are split into `GeneratorUnavailable` (the call
/// itself failed) and `GeneratorProtocol` (the call succeeded but the output
/// could not be coerced). Only the former is surfaced to callers; the latter is
/// recovered inside the repair and plan extraction layers.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BrainstormError {
    /// The external generator could not be reached or returned a non-success status.
    #[error("Generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// The generator answered but its output could not be understood.
    #[error("Generator protocol error: {0}")]
    GeneratorProtocol(String),

    /// A connector referenced a shape that does not exist.
    #[error("Invalid connector endpoints: start={start:?}, end={end:?}")]
    InvalidEndpoints {
        start: Option<String>,
        end: Option<String>,
    },

    /// The intent classifier returned a type we do not route on.
    #[error("Unknown intent type: {0}")]
    UnknownIntentType(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A step was requested before any plan exists.
    #[error("No plan has been requested for this session")]
    NoPlan,

    /// A step or planning round is already pending for this session.
    #[error("Another plan operation is already in flight for this session")]
    StepInFlight,

    /// A newer planning round replaced the one this result belongs to.
    #[error("Planning round {round} was superseded")]
    PlanSuperseded { round: u64 },

    /// Executing a step failed; the cursor was not advanced.
    #[error("Step {step_index} failed (plan complete: {plan_complete}): {message}")]
    StepFailed {
        step_index: usize,
        plan_complete: bool,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrainstormError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a GeneratorUnavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::GeneratorUnavailable(message.into())
    }

    /// Creates a GeneratorProtocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::GeneratorProtocol(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps a failure of step `step_index`, keeping the completion flag the
    /// session had before the attempt.
    pub fn step_failed(step_index: usize, plan_complete: bool, cause: &BrainstormError) -> Self {
        Self::StepFailed {
            step_index,
            plan_complete,
            message: cause.to_string(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the generator call itself failed
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::GeneratorUnavailable(_))
    }

    /// Check if this is a step failure that can be retried
    pub fn is_step_failed(&self) -> bool {
        matches!(self, Self::StepFailed { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for BrainstormError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for BrainstormError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BrainstormError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, BrainstormError>`.
pub type Result<T> = std::result::Result<T, BrainstormError>;
