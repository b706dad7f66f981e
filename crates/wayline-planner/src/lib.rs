//! # Wayline Planner
//!
//! Turns a natural-language task into a validated [`wayline_core::Plan`] by
//! negotiating with a language model over a tool-calling protocol.

pub mod cache;
pub mod negotiator;
pub mod planner;
pub mod validator;

pub use cache::{ActionCache, CacheKey, CacheStats};
pub use negotiator::{LlmPlanner, RoundOutcome};
pub use planner::{
    Negotiated, NegotiationFailure, NegotiationReport, NegotiationResult, Planner, PlannerConfig,
    DEFAULT_MAX_ROUNDS,
};
pub use validator::{normalize_name, parse_plan_text, validate};
