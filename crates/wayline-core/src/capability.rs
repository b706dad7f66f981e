//! Capability provider interface and the per-kind handler table.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::WaylineError;
use crate::types::ActionKind;

/// External collaborator driving a live automation session.
///
/// Every call may fail; callers turn failures into data instead of
/// propagating them.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Describe what is currently on the page.
    async fn observe(&self, query: &str) -> anyhow::Result<String>;

    /// Read content from the page.
    async fn extract(&self, query: &str) -> anyhow::Result<String>;

    /// Perform a state-changing action.
    async fn act(&self, query: &str) -> anyhow::Result<String>;
}

/// Future returned by a capability handler.
pub type CapabilityFuture<'a> = BoxFuture<'a, anyhow::Result<String>>;

/// A function dispatching one [`ActionKind`] to its provider operation.
pub type CapabilityHandler =
    for<'a> fn(&'a dyn CapabilityProvider, &'a str) -> CapabilityFuture<'a>;

fn call_observe<'a>(provider: &'a dyn CapabilityProvider, query: &'a str) -> CapabilityFuture<'a> {
    provider.observe(query)
}

fn call_extract<'a>(provider: &'a dyn CapabilityProvider, query: &'a str) -> CapabilityFuture<'a> {
    provider.extract(query)
}

fn call_act<'a>(provider: &'a dyn CapabilityProvider, query: &'a str) -> CapabilityFuture<'a> {
    provider.act(query)
}

impl ActionKind {
    /// The provider operation backing this kind.
    pub fn handler(self) -> CapabilityHandler {
        match self {
            ActionKind::Observe => call_observe,
            ActionKind::Extract => call_extract,
            ActionKind::Act => call_act,
        }
    }

    /// Invoke the provider operation for this kind.
    pub async fn invoke(
        self,
        provider: &dyn CapabilityProvider,
        query: &str,
    ) -> anyhow::Result<String> {
        (self.handler())(provider, query).await
    }
}

/// Serialize a failed capability call as the JSON payload recorded in its place.
pub fn error_payload(kind: ActionKind, query: &str, err: &anyhow::Error) -> String {
    let error = WaylineError::CapabilityInvocation {
        kind,
        message: format!("{:#}", err),
    };
    serde_json::json!({
        "error": error.to_string(),
        "kind": kind,
        "query": query,
    })
    .to_string()
}

/// Returns true if `output` is a payload produced by [`error_payload`].
pub fn is_error_payload(output: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(output)
        .ok()
        .and_then(|v| v.get("error").map(|e| e.is_string()))
        .unwrap_or(false)
}

/// In-memory capability provider for tests and demos.
///
/// Responses are looked up by `(kind, query)` first, then by kind; anything
/// else echoes the call. Every invocation is recorded.
#[derive(Default)]
pub struct RecordingCapabilityProvider {
    responses: HashMap<(ActionKind, String), String>,
    defaults: HashMap<ActionKind, String>,
    failures: HashMap<(ActionKind, String), String>,
    calls: Mutex<Vec<(ActionKind, String)>>,
}

impl RecordingCapabilityProvider {
    /// Create a provider that echoes every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` of `kind` with `response`.
    pub fn with_response(
        mut self,
        kind: ActionKind,
        query: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.responses.insert((kind, query.into()), response.into());
        self
    }

    /// Answer every otherwise unmatched call of `kind` with `response`.
    pub fn with_default(mut self, kind: ActionKind, response: impl Into<String>) -> Self {
        self.defaults.insert(kind, response.into());
        self
    }

    /// Fail `query` of `kind` with `message`.
    pub fn with_failure(
        mut self,
        kind: ActionKind,
        query: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures.insert((kind, query.into()), message.into());
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<(ActionKind, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls received for `kind`.
    pub fn call_count(&self, kind: ActionKind) -> usize {
        self.calls().iter().filter(|(k, _)| *k == kind).count()
    }

    fn respond(&self, kind: ActionKind, query: &str) -> anyhow::Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind, query.to_string()));
        }

        let key = (kind, query.to_string());
        if let Some(message) = self.failures.get(&key) {
            anyhow::bail!("{}", message);
        }

        Ok(self
            .responses
            .get(&key)
            .or_else(|| self.defaults.get(&kind))
            .cloned()
            .unwrap_or_else(|| format!("{}({}) => ok", kind.as_str().to_uppercase(), query)))
    }
}

#[async_trait]
impl CapabilityProvider for RecordingCapabilityProvider {
    async fn observe(&self, query: &str) -> anyhow::Result<String> {
        self.respond(ActionKind::Observe, query)
    }

    async fn extract(&self, query: &str) -> anyhow::Result<String> {
        self.respond(ActionKind::Extract, query)
    }

    async fn act(&self, query: &str) -> anyhow::Result<String> {
        self.respond(ActionKind::Act, query)
    }
}
