//! Sequential plan executor.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use wayline_core::{
    error_payload, ArtifactRef, ArtifactSink, CapabilityProvider, CaptureRequest, ExecutionTrace,
    Plan, PlanStep, TraceEntry, WaylineError,
};

/// Runs plan steps one at a time against the capability provider.
///
/// A failing step never stops the run: its output becomes a JSON error
/// payload and execution moves on. Retries are the provider's business.
pub struct StepExecutor {
    capabilities: Arc<dyn CapabilityProvider>,
    artifacts: Arc<dyn ArtifactSink>,
}

impl StepExecutor {
    /// Create a new executor.
    pub fn new(
        capabilities: Arc<dyn CapabilityProvider>,
        artifacts: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            capabilities,
            artifacts,
        }
    }

    /// Execute every step of `plan` in order.
    pub async fn execute(&self, plan: &Plan) -> ExecutionTrace {
        info!("🚀 Executing plan {} with {} steps", plan.id, plan.len());

        let mut trace = ExecutionTrace::new();
        for (index, step) in plan.iter().enumerate() {
            let entry = self.run_step(index + 1, step).await;
            trace.push(entry);
        }
        trace.finish();

        info!(
            "✅ Execution complete for plan {} ({}/{} steps succeeded)",
            plan.id,
            trace.len() - trace.failed_entries().len(),
            trace.len()
        );
        trace
    }

    async fn run_step(&self, ordinal: usize, step: &PlanStep) -> TraceEntry {
        let kind = step.kind();
        let query = step.query();
        info!("  📌 Step {}: {}({})", ordinal, kind, query);

        let started_at = Utc::now();
        let timer = Instant::now();
        let (output, succeeded) = match kind.invoke(self.capabilities.as_ref(), query).await {
            Ok(output) => (output, true),
            Err(e) => {
                warn!(ordinal, kind = %kind, query, error = %e, "step failed");
                (error_payload(kind, query, &e), false)
            }
        };
        let duration_ms = timer.elapsed().as_millis() as u64;

        let artifact = self.capture(ordinal, step).await;

        TraceEntry {
            ordinal,
            step: step.clone(),
            output,
            artifact,
            succeeded,
            started_at,
            duration_ms,
        }
    }

    async fn capture(&self, ordinal: usize, step: &PlanStep) -> Option<ArtifactRef> {
        let request = CaptureRequest::new(ordinal, step.kind(), step.query());
        match self.artifacts.capture(&request).await {
            Ok(artifact) => artifact,
            Err(e) => {
                let err = WaylineError::ArtifactCapture {
                    ordinal,
                    message: format!("{:#}", e),
                };
                warn!(ordinal, slug = %request.slug, error = %err, "artifact capture failed");
                None
            }
        }
    }
}
