//! Merge pipeline
//!
//! Load the registry, resolve and load the inputs, merge, then write the
//! merged document. Every fatal error surfaces before anything is written.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::info;
use vkp_engine::{merge_profiles, MergeDiagnostic, MergeError, MergeMode, MergeOptions};
use vkp_registry::{RegistryError, RegistrySnapshot};

use crate::config::{ConfigError, MergeSettings};
use crate::inputs::{self, InputError};
use crate::output::{self, OutputError};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 2,
            PipelineError::Registry(_) => 3,
            PipelineError::Input(_) => 4,
            PipelineError::Merge(_) => 5,
            PipelineError::Output(_) => 6,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub mode: MergeMode,
    pub profile_name: String,
    pub output_path: PathBuf,
    /// Input profiles in merge order.
    pub inputs: Vec<String>,
    pub diagnostics: Vec<MergeDiagnostic>,
}

pub struct Pipeline {
    settings: MergeSettings,
    now: Option<NaiveDateTime>,
}

impl Pipeline {
    pub fn new(settings: MergeSettings) -> Self {
        Self {
            settings,
            now: None,
        }
    }

    /// Pin the clock used for generated names and history dates.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn run(&self) -> PipelineResult<MergeReport> {
        let settings = &self.settings;
        let now = self.now.unwrap_or_else(|| Local::now().naive_local());

        let registry = RegistrySnapshot::from_file(&settings.registry)?;
        info!(
            path = %settings.registry.display(),
            structs = registry.struct_count(),
            "loaded registry"
        );

        let resolved = inputs::resolve(&settings.inputs, &settings.profile_glob)?;
        for (profile, path) in resolved.sources() {
            info!(%profile, path = %path.display(), "input profile");
        }

        let profile_name = match &settings.output_profile {
            Some(name) => name.clone(),
            None => output::generated_profile_name(&settings.name_prefix, now),
        };
        let output_path = output::output_path(settings.output_path.as_deref(), &profile_name);

        let options = MergeOptions::new(settings.mode, profile_name.as_str())
            .with_label(settings.label.as_str())
            .with_author(settings.author.as_str())
            .with_date(now.date());

        let outcome = merge_profiles(&registry, &resolved.merge_inputs(), &options)?;
        output::write_document(&output_path, &outcome.document)?;
        info!(
            path = %output_path.display(),
            profile = %profile_name,
            diagnostics = outcome.diagnostics.len(),
            "wrote merged profile"
        );

        Ok(MergeReport {
            mode: settings.mode,
            profile_name,
            output_path,
            inputs: resolved.sources().map(|(p, _)| p.to_string()).collect(),
            diagnostics: outcome.diagnostics,
        })
    }
}
