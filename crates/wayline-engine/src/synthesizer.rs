//! Final-answer synthesis from the ordered output trace.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wayline_core::{is_error_payload, ActionKind, Plan};

/// Sentence returned when no output qualifies.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "The task was completed, but no readable result could be extracted.";

lazy_static! {
    static ref KIND_PREFIX: Regex =
        Regex::new(r"(?is)^\s*(observe|extract|act)\s*\(.*?\)\s*=>\s*").expect("valid regex");
    static ref LABEL_PREFIX: Regex = Regex::new(
        r"(?i)^\s*(headline|title|heading|result|answer|text|content|extracted|extraction)\s*:\s*"
    )
    .expect("valid regex");
}

const UNWRAP_FIELDS: [&str; 4] = ["extraction", "text", "result", "content"];
const NAVIGATION_MARKERS: [&str; 3] = ["navigated to", "http://", "https://"];
const ECHO_PREFIXES: [&str; 5] = [
    "action performed",
    "action completed",
    "clicked",
    "typed",
    "observed",
];
const NOT_FOUND_MARKER: &str = "not found";

/// Synthesizer thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// An Extract output must be strictly longer than this to qualify.
    pub min_extract_chars: usize,

    /// A fallback output without a navigation marker must be strictly longer than this.
    pub min_fallback_chars: usize,

    pub fallback_message: String,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            min_extract_chars: 3,
            min_fallback_chars: 20,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Derives one human-meaningful string from a plan's outputs.
#[derive(Debug, Clone, Default)]
pub struct ResultSynthesizer {
    config: SynthesizerConfig,
}

impl ResultSynthesizer {
    pub fn new(config: SynthesizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Pick the final answer.
    ///
    /// The latest qualifying Extract output wins. Otherwise the last
    /// non-echo output that mentions navigation or is long enough. Otherwise
    /// the fallback sentence.
    pub fn synthesize(&self, plan: &Plan, outputs: &[String]) -> String {
        if let Some(answer) = self.from_extractions(plan, outputs) {
            debug!(chars = answer.chars().count(), "answer taken from extract step");
            return answer;
        }

        if let Some(answer) = self.from_any_output(outputs) {
            debug!(chars = answer.chars().count(), "answer taken from fallback scan");
            return answer;
        }

        debug!("no output qualified, using fallback message");
        self.config.fallback_message.clone()
    }

    fn from_extractions(&self, plan: &Plan, outputs: &[String]) -> Option<String> {
        plan.steps()
            .iter()
            .zip(outputs)
            .rev()
            .filter(|(step, _)| step.kind() == ActionKind::Extract)
            .filter(|(_, output)| !is_error_payload(output))
            .map(|(_, output)| clean_output(output))
            .find(|cleaned| {
                cleaned.chars().count() > self.config.min_extract_chars
                    && !cleaned.to_lowercase().contains(NOT_FOUND_MARKER)
            })
    }

    fn from_any_output(&self, outputs: &[String]) -> Option<String> {
        outputs
            .iter()
            .rev()
            .filter(|output| !is_error_payload(output) && !is_echo(output))
            .map(|output| clean_output(output))
            .find(|cleaned| {
                let lower = cleaned.to_lowercase();
                NAVIGATION_MARKERS.iter().any(|m| lower.contains(m))
                    || cleaned.chars().count() > self.config.min_fallback_chars
            })
    }
}

/// Strip known technical prefixes, quotes and JSON wrappers from an output.
pub fn clean_output(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    if let Some(m) = KIND_PREFIX.find(text) {
        return text[m.end()..].trim().to_string();
    }
    if let Some(m) = LABEL_PREFIX.find(text) {
        return text[m.end()..].trim().to_string();
    }
    if let Some(inner) = unwrap_json_field(text) {
        return inner.trim().to_string();
    }
    strip_quotes(text).trim().to_string()
}

fn unwrap_json_field(text: &str) -> Option<String> {
    if !text.starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    UNWRAP_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(|v| v.as_str()))
        .map(str::to_string)
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Generic action/observation acknowledgements carrying no answer.
fn is_echo(raw: &str) -> bool {
    let raw_upper = raw.trim_start().to_uppercase();
    if raw_upper.starts_with("ACT(") || raw_upper.starts_with("OBSERVE(") {
        return true;
    }

    let cleaned = clean_output(raw);
    let lower = cleaned.to_lowercase();
    cleaned.is_empty()
        || cleaned == "[]"
        || cleaned == "{}"
        || ECHO_PREFIXES.iter().any(|p| lower.starts_with(p))
}
