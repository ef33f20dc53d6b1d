//! Capability merge engine for Vulkan profiles documents.
//!
//! Combines the capability blocks of several profiles into one, either as a
//! union (everything any input supports) or an intersection (what every
//! input supports). Struct identity is reconciled across aliases and core
//! promotions before members are merged, and every member is combined
//! according to the limit type the [`Registry`](vkp_registry::Registry)
//! assigns it.

pub mod blocks;
pub mod context;
pub mod diagnostics;
pub mod document;
pub mod field;
pub mod merger;
pub mod mode;
pub mod reconcile;
pub mod version;

pub use context::MergeContext;
pub use diagnostics::{DiagnosticKind, Diagnostics, MergeDiagnostic};
pub use document::{CapabilityBlock, Profile, ProfilesDocument};
pub use field::{merge_field, FieldEngine, FieldOutcome, StructKind};
pub use merger::{
    merge_profiles, MergeError, MergeInput, MergeOptions, MergeOutcome, ProfileMerger,
    BASELINE_BLOCK, DEFAULT_AUTHOR, DEFAULT_LABEL,
};
pub use mode::{MergeMode, MergeStep, ParseModeError};
pub use reconcile::{ReconcilePlan, Reconciler};
pub use version::{ApiVersion, SchemaVersion};
