//! Error types for the Wayline engine.

use thiserror::Error;

use crate::types::ActionKind;

/// Main error type for Wayline operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaylineError {
    /// The negotiator used its whole round budget without a finalized plan.
    #[error("Planning exhausted after {rounds} rounds without a finalized plan")]
    PlanningExhausted { rounds: u32 },

    /// The submitted plan is not an object carrying a step sequence.
    #[error("Invalid plan shape: {message}")]
    InvalidPlanShape { message: String },

    /// A single step of the submitted plan is malformed.
    #[error("Invalid plan step at index {index}: {message}")]
    InvalidPlanStep { index: usize, message: String },

    /// A capability provider call failed.
    #[error("Capability {kind} failed: {message}")]
    CapabilityInvocation { kind: ActionKind, message: String },

    /// Artifact capture for a step failed.
    #[error("Artifact capture failed for step {ordinal}: {message}")]
    ArtifactCapture { ordinal: usize, message: String },

    /// The completion provider could not produce a response.
    #[error("Completion provider error: {0}")]
    Completion(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WaylineError {
    /// Returns the offending step index for step-level plan errors.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            WaylineError::InvalidPlanStep { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Shorthand for an [`WaylineError::InvalidPlanStep`].
    pub fn invalid_step(index: usize, message: impl Into<String>) -> Self {
        WaylineError::InvalidPlanStep {
            index,
            message: message.into(),
        }
    }
}

/// Convenience Result type for Wayline operations.
pub type Result<T> = std::result::Result<T, WaylineError>;

impl From<serde_json::Error> for WaylineError {
    fn from(err: serde_json::Error) -> Self {
        WaylineError::Serialization(err.to_string())
    }
}
