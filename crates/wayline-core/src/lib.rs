//! # Wayline Core
//!
//! Core primitives and collaborator interfaces for the Wayline engine.
//!
//! This crate provides the fundamental building blocks:
//! - [`ActionKind`] - The closed set of capabilities (observe, extract, act)
//! - [`Plan`] - Ordered list of validated steps
//! - [`ExecutionTrace`] - Per-step outputs of a run
//! - [`CapabilityProvider`] / [`ArtifactSink`] - External collaborators
//! - [`WaylineError`] - Engine error types

pub mod artifact;
pub mod capability;
pub mod error;
pub mod plan;
pub mod trace;
pub mod types;

// Re-exports for convenience
pub use artifact::{slugify, ArtifactRef, ArtifactSink, CaptureRequest, NoopArtifactSink};
pub use capability::{
    error_payload, is_error_payload, CapabilityProvider, RecordingCapabilityProvider,
};
pub use error::{Result, WaylineError};
pub use plan::{Plan, PlanStep};
pub use trace::{ExecutionTrace, NavigationResult, TraceEntry};
pub use types::ActionKind;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::artifact::{ArtifactRef, ArtifactSink, CaptureRequest};
    pub use crate::capability::CapabilityProvider;
    pub use crate::error::{Result, WaylineError};
    pub use crate::plan::{Plan, PlanStep};
    pub use crate::trace::{ExecutionTrace, NavigationResult};
    pub use crate::types::ActionKind;
}
