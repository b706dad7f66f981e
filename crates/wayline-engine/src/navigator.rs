//! Plan, execute and synthesize in one call.

use std::sync::Arc;

use tracing::{error, info};
use wayline_core::{
    ArtifactSink, CapabilityProvider, ExecutionTrace, NavigationResult, Plan, Result,
};
use wayline_negotiate::CompletionProvider;
use wayline_planner::{LlmPlanner, Planner};

use crate::config::EngineConfig;
use crate::executor::StepExecutor;
use crate::synthesizer::ResultSynthesizer;

/// Entry point driving one automation session.
///
/// Methods take `&mut self`: the capability provider drives a single browser
/// session, so at most one plan or execution runs through a navigator at a
/// time.
pub struct Navigator {
    planner: Box<dyn Planner>,
    executor: StepExecutor,
    synthesizer: ResultSynthesizer,
}

impl Navigator {
    /// Create a navigator with default configuration.
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        capabilities: Arc<dyn CapabilityProvider>,
        artifacts: Arc<dyn ArtifactSink>,
    ) -> Self {
        let planner = LlmPlanner::new(completion, capabilities.clone());
        Self::with_planner(
            Box::new(planner),
            StepExecutor::new(capabilities, artifacts),
            ResultSynthesizer::default(),
        )
    }

    /// Create a navigator with custom configuration.
    pub fn with_config(
        completion: Arc<dyn CompletionProvider>,
        capabilities: Arc<dyn CapabilityProvider>,
        artifacts: Arc<dyn ArtifactSink>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let planner = LlmPlanner::with_config(completion, capabilities.clone(), config.planner);
        Ok(Self::with_planner(
            Box::new(planner),
            StepExecutor::new(capabilities, artifacts),
            ResultSynthesizer::new(config.synthesizer),
        ))
    }

    /// Assemble a navigator from its parts.
    pub fn with_planner(
        planner: Box<dyn Planner>,
        executor: StepExecutor,
        synthesizer: ResultSynthesizer,
    ) -> Self {
        Self {
            planner,
            executor,
            synthesizer,
        }
    }

    pub fn planner(&self) -> &dyn Planner {
        self.planner.as_ref()
    }

    pub fn synthesizer(&self) -> &ResultSynthesizer {
        &self.synthesizer
    }

    /// Negotiate a plan for `task`.
    pub async fn plan(&mut self, task: &str) -> Result<Plan> {
        info!("📋 Planning task ({} chars)", task.len());
        match self.planner.plan(task).await {
            Ok(plan) => {
                info!("✅ Plan {} ready with {} steps", plan.id, plan.len());
                Ok(plan)
            }
            Err(e) => {
                error!("❌ Planning failed: {}", e);
                Err(e)
            }
        }
    }

    /// Run an existing plan.
    pub async fn execute(&mut self, plan: &Plan) -> ExecutionTrace {
        self.executor.execute(plan).await
    }

    /// Reduce a plan's outputs to one answer.
    pub fn synthesize(&self, plan: &Plan, outputs: &[String]) -> String {
        self.synthesizer.synthesize(plan, outputs)
    }

    /// Plan `task`, execute the plan and synthesize the final answer.
    ///
    /// Only planning can fail; step failures are recorded in the trace.
    pub async fn navigate(&mut self, task: &str) -> Result<NavigationResult> {
        let plan = self.plan(task).await?;
        let trace = self.execute(&plan).await;
        let final_output = self.synthesize(&plan, &trace.outputs());

        info!(
            plan_id = %plan.id,
            steps = plan.len(),
            failed = trace.failed_entries().len(),
            duration_ms = trace.total_duration_ms(),
            "🏁 Navigation complete"
        );
        Ok(NavigationResult::new(plan, trace, final_output))
    }
}
