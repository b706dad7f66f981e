//! # Wayline Negotiate
//!
//! Tool-calling conversation protocol between the planner and a language model.

pub mod protocol;
pub mod session;

pub use protocol::{
    tool_surface, ChatMessage, Completion, CompletionProvider, CompletionRequest, PlannerTool,
    ResponseFormat, Role, ScriptedCompletionProvider, ToolCall, ToolChoice, ToolSpec,
    FINALIZE_TOOL,
};
pub use session::{ConversationState, NegotiationState};
