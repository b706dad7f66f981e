//! Conversation protocol messages.
//!
//! The planner talks to a language model through a [`CompletionProvider`]: it
//! sends the transcript plus a tool surface and gets back either tool calls or
//! free-form text.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wayline_core::ActionKind;

/// Name of the tool the model calls to submit its plan.
pub const FINALIZE_TOOL: &str = "finalize_plan";

/// Role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The task request.
    User,
    /// Model output.
    Assistant,
    /// Result of a tool call.
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id; tool results reference it.
    pub id: String,

    /// Name of the tool.
    pub name: String,

    /// Arguments as JSON.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single transcript message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    pub content: String,

    /// Tool calls made by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// For tool messages, the call this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Assistant turn that requested tool calls.
    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::with_role(Role::Assistant, "")
        }
    }

    /// Result of the tool call `call_id`.
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }
}

/// Description of one tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments.
    pub parameters: serde_json::Value,
}

/// Whether the model may or must call a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// The model decides.
    #[default]
    Auto,
    /// The model must call some tool.
    Required,
    /// Tools are disabled.
    None,
}

/// Format of free-form text responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Unconstrained text.
    Text,
    /// Text must be a syntactically valid JSON object.
    #[default]
    JsonObject,
}

/// One completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
    pub tool_choice: ToolChoice,
    pub response_format: ResponseFormat,
    pub temperature: f32,
}

/// What the model answered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Completion {
    /// Free-form text, if any.
    #[serde(default)]
    pub content: Option<String>,

    /// Requested tool calls, in the order the model issued them.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    /// A text-only completion.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A completion requesting tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// External collaborator producing model completions.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<Completion>;
}

/// The tools the planner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerTool {
    /// One of the three capabilities.
    Capability(ActionKind),
    /// Submit the final plan.
    FinalizePlan,
}

impl PlannerTool {
    /// Resolve a tool name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == FINALIZE_TOOL {
            return Some(PlannerTool::FinalizePlan);
        }
        name.parse::<ActionKind>().ok().map(PlannerTool::Capability)
    }
}

fn capability_spec(kind: ActionKind) -> ToolSpec {
    let description = match kind {
        ActionKind::Observe => {
            "Inspect the current page and describe elements relevant to the query. Read-only."
        }
        ActionKind::Extract => "Read and return content from the current page. Read-only.",
        ActionKind::Act => {
            "Perform one action on the page (navigate, click, type, select, scroll...). Changes page state."
        }
    };

    ToolSpec {
        name: kind.as_str().to_string(),
        description: description.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Natural-language instruction for this capability"
                }
            },
            "required": ["query"]
        }),
    }
}

fn finalize_spec() -> ToolSpec {
    ToolSpec {
        name: FINALIZE_TOOL.to_string(),
        description: "Submit the complete ordered plan. Call exactly once, when the plan is ready."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {
                                "type": "string",
                                "enum": ["observe", "extract", "act"]
                            },
                            "query": {
                                "type": "string",
                                "description": "Natural-language description of the step"
                            }
                        },
                        "required": ["name", "query"]
                    }
                }
            },
            "required": ["steps"]
        }),
    }
}

/// The four-tool surface offered on every negotiation round.
pub fn tool_surface() -> Vec<ToolSpec> {
    ActionKind::ALL
        .iter()
        .map(|kind| capability_spec(*kind))
        .chain(std::iter::once(finalize_spec()))
        .collect()
}

/// Scripted reply for [`ScriptedCompletionProvider`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Completion(Completion),
    Failure(String),
}

/// Completion provider replaying a fixed script, for tests and examples.
///
/// Once the script runs out the `fallback` completion is repeated; without a
/// fallback the provider fails.
#[derive(Default)]
pub struct ScriptedCompletionProvider {
    script: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<Completion>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletionProvider {
    pub fn new(replies: impl IntoIterator<Item = Completion>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(ScriptedReply::Completion).collect()),
            ..Self::default()
        }
    }

    /// Provider answering every request with `completion`.
    pub fn repeating(completion: Completion) -> Self {
        Self {
            fallback: Some(completion),
            ..Self::default()
        }
    }

    /// Append a failing reply to the script.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(ScriptedReply::Failure(message.into()));
        }
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletionProvider {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<Completion> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(ScriptedReply::Completion(completion)) => Ok(completion),
            Some(ScriptedReply::Failure(message)) => anyhow::bail!("{}", message),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| anyhow::anyhow!("completion script exhausted")),
        }
    }
}
