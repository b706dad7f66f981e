//! Execution trace types.
//!
//! An [`ExecutionTrace`] holds exactly one [`TraceEntry`] per plan step, in plan
//! order, whether the step succeeded or not.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::artifact::ArtifactRef;
use crate::plan::{Plan, PlanStep};

/// The recorded outcome of one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    /// 1-based position in the plan.
    pub ordinal: usize,

    /// The step that was executed.
    pub step: PlanStep,

    /// Provider output, or a JSON error payload if the provider failed.
    pub output: String,

    /// Captured artifact, if any.
    pub artifact: Option<ArtifactRef>,

    /// Whether the provider call succeeded.
    pub succeeded: bool,

    /// When the step started.
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the provider call in milliseconds.
    pub duration_ms: u64,
}

/// Ordered per-step outputs of one plan execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionTrace {
    /// Unique identifier for this trace.
    pub id: Uuid,

    /// Entries in plan order.
    pub entries: Vec<TraceEntry>,

    /// When execution started.
    pub started_at: DateTime<Utc>,

    /// When execution finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionTrace {
    /// Start an empty trace.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            entries: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append the entry for the next step.
    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    /// Mark the trace as complete.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outputs in plan order.
    pub fn outputs(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.output.clone()).collect()
    }

    /// Captured artifacts in plan order; steps without one are skipped.
    pub fn artifacts(&self) -> Vec<ArtifactRef> {
        self.entries
            .iter()
            .filter_map(|e| e.artifact.clone())
            .collect()
    }

    /// Entries whose provider call failed.
    pub fn failed_entries(&self) -> Vec<&TraceEntry> {
        self.entries.iter().filter(|e| !e.succeeded).collect()
    }

    /// Fraction of steps that succeeded (0.0 to 1.0). An empty trace scores 0.0.
    pub fn success_rate(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let succeeded = self.entries.iter().filter(|e| e.succeeded).count();
        succeeded as f32 / self.entries.len() as f32
    }

    /// Total time spent in provider calls.
    pub fn total_duration_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.duration_ms).sum()
    }
}

impl Default for ExecutionTrace {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a `navigate` call produces.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationResult {
    /// The negotiated plan.
    pub plan: Plan,

    /// One output per step, in plan order.
    pub outputs: Vec<String>,

    /// The single human-meaningful answer derived from the outputs.
    pub final_output: String,

    /// Captured artifacts in plan order.
    pub artifacts: Vec<ArtifactRef>,

    /// Full execution trace.
    pub trace: ExecutionTrace,
}

impl NavigationResult {
    /// Assemble a result from a plan, its trace and the synthesized answer.
    pub fn new(plan: Plan, trace: ExecutionTrace, final_output: String) -> Self {
        Self {
            outputs: trace.outputs(),
            artifacts: trace.artifacts(),
            plan,
            final_output,
            trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ordinal: usize, succeeded: bool, artifact: Option<&str>) -> TraceEntry {
        TraceEntry {
            ordinal,
            step: PlanStep::observe(format!("step {}", ordinal)).unwrap(),
            output: format!("output {}", ordinal),
            artifact: artifact.map(ArtifactRef::new),
            succeeded,
            started_at: Utc::now(),
            duration_ms: 10,
        }
    }

    #[test]
    fn test_outputs_and_artifacts_keep_order() {
        let mut trace = ExecutionTrace::new();
        trace.push(entry(1, true, Some("a.png")));
        trace.push(entry(2, false, None));
        trace.push(entry(3, true, Some("c.png")));
        trace.finish();

        assert_eq!(trace.outputs(), vec!["output 1", "output 2", "output 3"]);
        assert_eq!(
            trace.artifacts(),
            vec![ArtifactRef::new("a.png"), ArtifactRef::new("c.png")]
        );
        assert!(trace.finished_at.is_some());
        assert_eq!(trace.total_duration_ms(), 30);
    }

    #[test]
    fn test_success_rate() {
        let mut trace = ExecutionTrace::new();
        assert_eq!(trace.success_rate(), 0.0);

        trace.push(entry(1, true, None));
        trace.push(entry(2, true, None));
        trace.push(entry(3, false, None));

        assert!((trace.success_rate() - 0.666).abs() < 0.01);
        assert_eq!(trace.failed_entries().len(), 1);
        assert_eq!(trace.failed_entries()[0].ordinal, 2);
    }

    #[test]
    fn test_navigation_result_mirrors_trace() {
        let mut trace = ExecutionTrace::new();
        trace.push(entry(1, true, Some("1.png")));
        let plan = Plan::new(vec![PlanStep::observe("step 1").unwrap()]);

        let result = NavigationResult::new(plan, trace, "output 1".to_string());
        assert_eq!(result.outputs, vec!["output 1"]);
        assert_eq!(result.artifacts.len(), 1);
        assert_eq!(result.plan.len(), 1);
    }
}
