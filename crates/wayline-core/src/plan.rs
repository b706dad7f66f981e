//! Plan types for the Wayline engine.
//!
//! A [`Plan`] is the ordered list of atomic steps the executor runs. Steps are
//! only built through [`PlanStep::new`], so every step in a plan carries a
//! non-empty query.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, WaylineError};
use crate::types::ActionKind;

/// One atomic automation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    kind: ActionKind,
    query: String,
}

impl PlanStep {
    /// Create a step. The query is trimmed and must not be empty.
    pub fn new(kind: ActionKind, query: impl Into<String>) -> Result<Self> {
        let query = query.into();
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(WaylineError::invalid_step(0, "query must be a non-empty string"));
        }

        Ok(Self {
            kind,
            query: trimmed.to_string(),
        })
    }

    /// Shorthand for an observe step.
    pub fn observe(query: impl Into<String>) -> Result<Self> {
        Self::new(ActionKind::Observe, query)
    }

    /// Shorthand for an extract step.
    pub fn extract(query: impl Into<String>) -> Result<Self> {
        Self::new(ActionKind::Extract, query)
    }

    /// Shorthand for an act step.
    pub fn act(query: impl Into<String>) -> Result<Self> {
        Self::new(ActionKind::Act, query)
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// An ordered sequence of steps. Order is execution order.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: Uuid,

    /// Steps in execution order.
    steps: Vec<PlanStep>,

    /// When the plan was finalized.
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Create a plan from already validated steps.
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self {
            id: Uuid::new_v4(),
            steps,
            created_at: Utc::now(),
        }
    }

    /// A plan with no steps.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Kinds of every step, in order.
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.steps.iter().map(PlanStep::kind).collect()
    }
}

impl PartialEq for Plan {
    /// Plans are equal when their steps are; ids and timestamps are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a PlanStep;
    type IntoIter = std::slice::Iter<'a, PlanStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
