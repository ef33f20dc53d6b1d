//! Combination policy and per-input merge step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Combination policy for a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Superset of everything present in any input.
    #[default]
    Union,
    /// Only what every input supports.
    Intersection,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Union => "union",
            MergeMode::Intersection => "intersection",
        }
    }

    /// Mode name with its indefinite article, for generated descriptions.
    pub fn with_article(&self) -> &'static str {
        match self {
            MergeMode::Union => "a union",
            MergeMode::Intersection => "an intersection",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Mode must be either union or intersection, got '{0}'")]
pub struct ParseModeError(pub String);

impl FromStr for MergeMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "union" => Ok(MergeMode::Union),
            "intersection" => Ok(MergeMode::Intersection),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Mode plus the position of the input being folded in.
///
/// The first input seeds every accumulator; later inputs only extend
/// (union) or narrow (intersection) what was seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStep {
    pub mode: MergeMode,
    pub first: bool,
}

impl MergeStep {
    pub fn new(mode: MergeMode, first: bool) -> Self {
        Self { mode, first }
    }

    /// Step used to combine two views of the same input.
    pub fn combine() -> Self {
        Self::new(MergeMode::Union, false)
    }

    /// Whether entries absent from the accumulator may be added.
    pub fn seeds(&self) -> bool {
        self.mode == MergeMode::Union || self.first
    }

    /// Whether accumulated entries absent from the incoming input are dropped.
    pub fn narrows(&self) -> bool {
        self.mode == MergeMode::Intersection && !self.first
    }
}
