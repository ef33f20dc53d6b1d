//! Non-fatal merge diagnostics.
//!
//! A bad field never aborts a merge. The problem is recorded here, logged,
//! and the field keeps its last known value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Machine-readable diagnostic kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum DiagnosticKind {
    /// An `exact` member differs between inputs.
    #[serde(rename = "EXACT_MISMATCH")]
    ExactMismatch { existing: Value, incoming: Value },

    /// The member's limit type is not one the engine can combine.
    #[serde(rename = "UNKNOWN_LIMIT_TYPE")]
    UnknownLimitType(String),

    /// The registry has no definition for the member.
    #[serde(rename = "UNKNOWN_MEMBER")]
    UnknownMember,

    /// The values do not have the shape their limit type requires.
    #[serde(rename = "SHAPE_MISMATCH")]
    ShapeMismatch(String),

    /// A profile names a capability block its document does not define.
    #[serde(rename = "MISSING_CAPABILITY_BLOCK")]
    MissingCapabilityBlock,
}

/// A diagnostic attached to a location such as `VkPhysicalDeviceLimits.maxImageDimension2D`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeDiagnostic {
    pub location: String,
    pub kind: DiagnosticKind,
}

impl MergeDiagnostic {
    pub fn new(location: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }

    pub fn to_code(&self) -> String {
        match &self.kind {
            DiagnosticKind::ExactMismatch { .. } => format!("EXACT_MISMATCH:{}", self.location),
            DiagnosticKind::UnknownLimitType(raw) => {
                format!("UNKNOWN_LIMIT_TYPE:{}:{}", self.location, raw)
            }
            DiagnosticKind::UnknownMember => format!("UNKNOWN_MEMBER:{}", self.location),
            DiagnosticKind::ShapeMismatch(limit) => {
                format!("SHAPE_MISMATCH:{}:{}", self.location, limit)
            }
            DiagnosticKind::MissingCapabilityBlock => {
                format!("MISSING_CAPABILITY_BLOCK:{}", self.location)
            }
        }
    }
}

impl fmt::Display for MergeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::ExactMismatch { existing, incoming } => write!(
                f,
                "{}: values with exact limit type differ ({} vs {})",
                self.location, existing, incoming
            ),
            DiagnosticKind::UnknownLimitType(raw) => {
                write!(f, "{}: unknown limit type '{}'", self.location, raw)
            }
            DiagnosticKind::UnknownMember => {
                write!(f, "{}: member not found in registry", self.location)
            }
            DiagnosticKind::ShapeMismatch(limit) => write!(
                f,
                "{}: values do not have the shape a '{}' limit requires",
                self.location, limit
            ),
            DiagnosticKind::MissingCapabilityBlock => {
                write!(f, "{}: capability block not defined", self.location)
            }
        }
    }
}

/// Collects diagnostics for one merge run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<MergeDiagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: MergeDiagnostic) {
        tracing::warn!(code = %diagnostic.to_code(), "{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn report(&mut self, location: impl Into<String>, kind: DiagnosticKind) {
        self.push(MergeDiagnostic::new(location, kind));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<MergeDiagnostic> {
        self.entries
    }
}
