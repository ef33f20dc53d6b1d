//! Vulkan profiles merge tool
//!
//! Combines capability profiles from several documents into one, as a
//! union or an intersection, driven by a registry snapshot that classifies
//! every struct member.
//!
//! The merge itself lives in `vkp-engine`; this crate adds layered
//! configuration, input discovery, output naming and the pipeline tying
//! them together.

pub mod config;
pub mod inputs;
pub mod output;
pub mod pipeline;

pub use config::{ConfigError, EffectiveConfig, InputSelection, MergeSettings};
pub use inputs::{InputError, ResolvedInputs};
pub use output::OutputError;
pub use pipeline::{MergeReport, Pipeline, PipelineError, PipelineResult};
