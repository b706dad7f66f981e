//! Common types used across the Wayline engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of capabilities a plan step can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Query the current page state.
    Observe,
    /// Read content from the page.
    Extract,
    /// Mutate the page state (click, type, navigate...).
    Act,
}

impl ActionKind {
    /// All kinds, in canonical order.
    pub const ALL: [ActionKind; 3] = [ActionKind::Observe, ActionKind::Extract, ActionKind::Act];

    /// Canonical lowercase name, also used as the tool name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Observe => "observe",
            ActionKind::Extract => "extract",
            ActionKind::Act => "act",
        }
    }

    /// Returns true for kinds that never change page state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, ActionKind::Observe | ActionKind::Extract)
    }

    /// Returns true for kinds that may change page state.
    pub fn is_mutating(&self) -> bool {
        !self.is_read_only()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    /// Parses canonical names only; synonyms are the validator's business.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "observe" => Ok(ActionKind::Observe),
            "extract" => Ok(ActionKind::Extract),
            "act" => Ok(ActionKind::Act),
            other => Err(format!("Unknown action kind: {}", other)),
        }
    }
}
