//! Language-model plan negotiator.
//!
//! The negotiator offers the model three capability tools plus
//! `finalize_plan` and loops until the model submits a valid plan or the
//! round budget runs out. Capability calls made while planning go through a
//! per-negotiation [`ActionCache`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use wayline_core::{error_payload, ActionKind, CapabilityProvider, Plan, Result, WaylineError};
use wayline_negotiate::{
    tool_surface, ChatMessage, CompletionProvider, CompletionRequest, ConversationState,
    NegotiationState, PlannerTool, ResponseFormat, ToolCall, ToolChoice,
};

use crate::cache::ActionCache;
use crate::planner::{
    truncate_for_log, Negotiated, NegotiationFailure, NegotiationReport, NegotiationResult, Planner,
    PlannerConfig,
};
use crate::validator::{decode_arguments, parse_plan_text, validate};

const DEFAULT_SYSTEM_PROMPT: &str = r#"You plan web automation tasks for a browser agent.

You can use three capabilities while planning:
- observe(query): look at the current page and describe relevant elements. Read-only.
- extract(query): read content from the current page. Read-only.
- act(query): perform one action such as navigating, clicking, typing, selecting or scrolling. Changes the page.

Break the task into small atomic steps, each using exactly one capability. Write every step
query in plain natural language describing what to do or find ("click the Sign in button",
"the price of the first result"). Never write CSS selectors, XPath, or code.

When the plan is complete, call finalize_plan exactly once with:
{"steps": [{"name": "observe" | "extract" | "act", "query": "..."}]}

If you cannot call tools, reply with that same JSON object and nothing else."#;

/// Outcome of a single negotiation round.
#[derive(Debug, Clone)]
pub enum RoundOutcome {
    /// Keep negotiating with the extended transcript.
    Continue(ConversationState),
    /// The model submitted a valid plan.
    Finalized(Plan),
}

/// Planner negotiating plans with a language model.
pub struct LlmPlanner {
    completion: Arc<dyn CompletionProvider>,
    capabilities: Arc<dyn CapabilityProvider>,
    config: PlannerConfig,
}

impl LlmPlanner {
    /// Create a planner with default configuration.
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        capabilities: Arc<dyn CapabilityProvider>,
    ) -> Self {
        Self::with_config(completion, capabilities, PlannerConfig::default())
    }

    /// Create a planner with custom configuration.
    pub fn with_config(
        completion: Arc<dyn CompletionProvider>,
        capabilities: Arc<dyn CapabilityProvider>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            completion,
            capabilities,
            config,
        }
    }

    /// The system instructions sent at the start of every negotiation.
    pub fn system_prompt(&self) -> &str {
        self.config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Negotiate a plan with a fresh cache.
    pub async fn plan_with_report(&self, task: &str) -> NegotiationResult {
        self.plan_with_cache(task, ActionCache::new()).await
    }

    /// Negotiate a plan using the given cache for capability calls.
    pub async fn plan_with_cache(&self, task: &str, mut cache: ActionCache) -> NegotiationResult {
        let max_rounds = self.config.max_rounds;
        info!(max_rounds, task_len = task.len(), "starting plan negotiation");

        let mut report = NegotiationReport::default();
        let mut state = ConversationState::seed(self.system_prompt(), task);

        for round in 1..=max_rounds {
            report.rounds = round;
            match self.run_round(state, &mut cache, &mut report).await {
                Ok(RoundOutcome::Continue(next)) => {
                    debug!(round, transcript_len = next.len(), "negotiation continues");
                    state = next;
                }
                Ok(RoundOutcome::Finalized(plan)) => {
                    report.state = NegotiationState::Finalized;
                    report.cache = cache.stats();
                    info!(
                        round,
                        step_count = plan.len(),
                        capability_calls = report.capability_calls,
                        cache_hits = report.cache.hits,
                        "plan finalized"
                    );
                    return Ok(Negotiated { plan, report });
                }
                Err(error) => {
                    report.state = NegotiationState::Failed;
                    report.cache = cache.stats();
                    error!(round, error = %error, ?report, "plan negotiation failed");
                    return Err(NegotiationFailure { error, report });
                }
            }
        }

        report.state = NegotiationState::Exhausted;
        report.cache = cache.stats();
        error!(
            rounds = max_rounds,
            ?report,
            "plan negotiation exhausted its round budget"
        );
        Err(NegotiationFailure {
            error: WaylineError::PlanningExhausted { rounds: max_rounds },
            report,
        })
    }

    /// Run one round: ask the model, then serve its tool calls or parse its text.
    pub async fn run_round(
        &self,
        state: ConversationState,
        cache: &mut ActionCache,
        report: &mut NegotiationReport,
    ) -> Result<RoundOutcome> {
        let request = CompletionRequest {
            messages: state.messages().to_vec(),
            tools: tool_surface(),
            tool_choice: ToolChoice::Auto,
            response_format: ResponseFormat::JsonObject,
            temperature: self.config.temperature,
        };

        let completion = self
            .completion
            .complete(request)
            .await
            .map_err(|e| WaylineError::Completion(format!("{:#}", e)))?;

        if completion.has_tool_calls() {
            let calls = completion.tool_calls;
            let mut state = state.with_message(ChatMessage::assistant_tool_calls(calls.clone()));

            for call in &calls {
                match PlannerTool::from_name(&call.name) {
                    Some(PlannerTool::FinalizePlan) => {
                        let raw = decode_arguments(&call.arguments)?;
                        return validate(&raw).map(RoundOutcome::Finalized);
                    }
                    Some(PlannerTool::Capability(kind)) => {
                        report.capability_calls += 1;
                        let payload = self.serve_capability(kind, call, cache).await;
                        state = state.with_message(ChatMessage::tool(&call.id, payload));
                    }
                    None => {
                        report.unknown_tool_calls += 1;
                        warn!(tool = %call.name, "model requested an unknown tool");
                        let payload = json!({ "error": format!("Unknown tool: {}", call.name) });
                        state =
                            state.with_message(ChatMessage::tool(&call.id, payload.to_string()));
                    }
                }
            }

            return Ok(RoundOutcome::Continue(state.advance()));
        }

        let text = completion.content.unwrap_or_default();
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                llm_output = %truncate_for_log(&text, self.config.log_preview_chars),
                "negotiator text reply"
            );
        }

        match parse_plan_text(&text) {
            Some(raw) => validate(&raw).map(RoundOutcome::Finalized),
            None => {
                report.text_replies += 1;
                Ok(RoundOutcome::Continue(
                    state.with_message(ChatMessage::assistant(text)).advance(),
                ))
            }
        }
    }

    async fn serve_capability(
        &self,
        kind: ActionKind,
        call: &ToolCall,
        cache: &mut ActionCache,
    ) -> String {
        let Some(query) = capability_query(&call.arguments) else {
            warn!(tool = %call.name, "capability call without a query");
            return json!({ "error": "Missing \"query\" argument", "kind": kind }).to_string();
        };

        debug!(kind = %kind, query = %query, "serving capability call");
        match cache.resolve(kind, &query, self.capabilities.as_ref()).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    kind = %kind,
                    query = %query,
                    error = %e,
                    "capability call failed during planning"
                );
                error_payload(kind, &query, &e)
            }
        }
    }
}

/// Pull the query out of capability tool arguments.
fn capability_query(arguments: &Value) -> Option<String> {
    let arguments = match arguments {
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => return Some(encoded.trim().to_string()).filter(|q| !q.is_empty()),
        },
        other => other.clone(),
    };

    ["query", "instruction"]
        .iter()
        .find_map(|key| arguments.get(*key).and_then(Value::as_str))
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, task: &str) -> Result<Plan> {
        self.plan_with_report(task)
            .await
            .map(|negotiated| negotiated.plan)
            .map_err(WaylineError::from)
    }

    fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn set_config(&mut self, config: PlannerConfig) {
        self.config = config;
    }
}
