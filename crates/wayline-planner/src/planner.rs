//! Planner trait and configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wayline_core::{Plan, Result, WaylineError};
use wayline_negotiate::NegotiationState;

use crate::cache::CacheStats;

/// Default number of negotiation rounds before giving up.
pub const DEFAULT_MAX_ROUNDS: u32 = 16;

/// Configuration for the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum number of completion rounds per negotiation.
    pub max_rounds: u32,

    /// Sampling temperature passed to the completion provider.
    pub temperature: f32,

    /// Replaces the built-in system instructions when set.
    pub system_prompt: Option<String>,

    /// Maximum characters of prompts/model output written to debug logs.
    pub log_preview_chars: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            temperature: 0.0,
            system_prompt: None,
            log_preview_chars: 2_000,
        }
    }
}

/// Trait for planning engines.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Turn a natural-language task into a validated plan.
    async fn plan(&self, task: &str) -> Result<Plan>;

    /// Get the planner configuration.
    fn config(&self) -> &PlannerConfig;

    /// Update the planner configuration.
    fn set_config(&mut self, config: PlannerConfig);
}

/// Bookkeeping for one negotiation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegotiationReport {
    /// Final state of the negotiation.
    pub state: NegotiationState,

    /// Completion rounds used.
    pub rounds: u32,

    /// Capability tool calls served (cache hits included).
    pub capability_calls: usize,

    /// Tool calls naming a tool the planner does not offer.
    pub unknown_tool_calls: usize,

    /// Free-form replies that did not contain a plan.
    pub text_replies: usize,

    /// Action cache counters at the end of the negotiation.
    pub cache: CacheStats,
}

impl Default for NegotiationReport {
    fn default() -> Self {
        Self {
            state: NegotiationState::Negotiating,
            rounds: 0,
            capability_calls: 0,
            unknown_tool_calls: 0,
            text_replies: 0,
            cache: CacheStats::default(),
        }
    }
}

/// Result of a successful negotiation.
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub plan: Plan,
    pub report: NegotiationReport,
}

/// A negotiation that ended without a plan, with its bookkeeping.
#[derive(Debug, Clone)]
pub struct NegotiationFailure {
    pub error: WaylineError,
    pub report: NegotiationReport,
}

impl From<NegotiationFailure> for WaylineError {
    fn from(failure: NegotiationFailure) -> Self {
        failure.error
    }
}

/// Outcome of a full negotiation; the report is kept on both paths.
pub type NegotiationResult = std::result::Result<Negotiated, NegotiationFailure>;

/// Shorten `input` to `max_chars` characters for logging.
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}
