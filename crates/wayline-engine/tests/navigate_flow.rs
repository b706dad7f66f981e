//! End-to-end navigation against scripted collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use wayline_core::{
    ActionKind, ArtifactRef, ArtifactSink, CaptureRequest, RecordingCapabilityProvider,
    WaylineError,
};
use wayline_engine::{EngineConfig, Navigator};
use wayline_negotiate::{Completion, ScriptedCompletionProvider, ToolCall};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct DirectorySink {
    captured: Mutex<Vec<CaptureRequest>>,
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn capture(&self, request: &CaptureRequest) -> anyhow::Result<Option<ArtifactRef>> {
        self.captured.lock().unwrap().push(request.clone());
        Ok(Some(ArtifactRef::new(format!("shots/{}.png", request.file_stem()))))
    }
}

fn call(id: &str, name: &str, query: &str) -> ToolCall {
    ToolCall::new(id, name, json!({ "query": query }))
}

#[tokio::test]
async fn test_explore_then_finalize_then_execute() {
    init_tracing();

    let completion = Arc::new(ScriptedCompletionProvider::new(vec![
        Completion::tool_calls(vec![call("c1", "act", "open https://news.example")]),
        Completion::tool_calls(vec![call("c2", "observe", "headline list")]),
        Completion::tool_calls(vec![ToolCall::new(
            "c3",
            "finalize_plan",
            json!({ "plan": [
                {"action": "open", "instruction": "open https://news.example"},
                {"type": "verify", "query": "headline list"},
                {"kind": "read", "query": "first headline"}
            ]}),
        )]),
    ]));
    let capabilities = Arc::new(
        RecordingCapabilityProvider::new()
            .with_default(ActionKind::Act, "Navigated to https://news.example")
            .with_default(ActionKind::Observe, "[{\"description\": \"headline list\"}]")
            .with_response(
                ActionKind::Extract,
                "first headline",
                r#"{"extraction": "Headline: Markets rally on rate news"}"#,
            ),
    );
    let sink = Arc::new(DirectorySink::default());
    let mut navigator = Navigator::new(completion.clone(), capabilities.clone(), sink.clone());

    let result = navigator.navigate("What is the first headline?").await.unwrap();

    assert_eq!(completion.request_count(), 3);
    assert_eq!(
        result.plan.kinds(),
        vec![ActionKind::Act, ActionKind::Observe, ActionKind::Extract]
    );
    // Two capability calls while planning, three while executing.
    assert_eq!(capabilities.calls().len(), 5);
    assert_eq!(result.final_output, "Markets rally on rate news");
    assert_eq!(
        result.artifacts,
        vec![
            ArtifactRef::new("shots/01-act-open-https-news-example.png"),
            ArtifactRef::new("shots/02-observe-headline-list.png"),
            ArtifactRef::new("shots/03-extract-first-headline.png"),
        ]
    );
    assert_eq!(sink.captured.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_failed_step_keeps_going() {
    init_tracing();

    let completion = Arc::new(ScriptedCompletionProvider::new(vec![Completion::text(
        r#"```json
{"steps": [
  {"name": "act", "query": "open the pricing page"},
  {"name": "click", "query": "the annual toggle"},
  {"name": "extract", "query": "the team plan price"}
]}
```"#,
    )]));
    let capabilities = Arc::new(
        RecordingCapabilityProvider::new()
            .with_failure(ActionKind::Act, "the annual toggle", "element not interactable")
            .with_response(ActionKind::Extract, "the team plan price", "$12 per seat"),
    );
    let sink = Arc::new(DirectorySink::default());
    let mut navigator = Navigator::new(completion, capabilities, sink.clone());

    let result = navigator.navigate("How much is the team plan?").await.unwrap();

    assert_eq!(result.outputs.len(), 3);
    assert!(result.outputs[1].contains("element not interactable"));
    assert_eq!(result.trace.failed_entries().len(), 1);
    assert_eq!(result.final_output, "$12 per seat");
    assert_eq!(sink.captured.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_config_document_drives_navigation() {
    init_tracing();

    let config = EngineConfig::from_json_str(
        r#"{"planner": {"max_rounds": 1}, "synthesizer": {"fallback_message": "no answer"}}"#,
    )
    .unwrap();
    let completion = Arc::new(ScriptedCompletionProvider::repeating(Completion::text(
        "Let me think about this first.",
    )));
    let mut navigator = Navigator::with_config(
        completion.clone(),
        Arc::new(RecordingCapabilityProvider::new()),
        Arc::new(DirectorySink::default()),
        config,
    )
    .unwrap();

    let err = navigator.navigate("anything").await.unwrap_err();

    assert_eq!(err, WaylineError::PlanningExhausted { rounds: 1 });
    assert_eq!(completion.request_count(), 1);
    assert_eq!(navigator.synthesizer().config().fallback_message, "no answer");
}
