//! Typed view of the effective configuration.

use std::path::PathBuf;

use vkp_engine::MergeMode;

use super::effective::{ConfigError, EffectiveConfig};
use crate::output::is_valid_profile_name;

/// Where the input profiles come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSelection {
    /// Explicit files, paired in order with the profile to take from each.
    Files {
        paths: Vec<PathBuf>,
        profiles: Vec<String>,
    },
    /// Profiles looked up across the files of a directory.
    Directory { dir: PathBuf, profiles: Vec<String> },
}

impl InputSelection {
    pub fn profiles(&self) -> &[String] {
        match self {
            InputSelection::Files { profiles, .. } => profiles,
            InputSelection::Directory { profiles, .. } => profiles,
        }
    }
}

/// Everything a merge run needs, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSettings {
    pub registry: PathBuf,
    pub mode: MergeMode,
    pub inputs: InputSelection,
    pub profile_glob: String,
    pub output_path: Option<PathBuf>,
    pub output_profile: Option<String>,
    pub label: String,
    pub author: String,
    pub name_prefix: String,
}

impl MergeSettings {
    pub fn from_config(config: &EffectiveConfig) -> Result<Self, ConfigError> {
        let registry = config
            .get_str("registry")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingRegistry)?;

        let mode: MergeMode = config.get_str("mode").unwrap_or("union").parse()?;

        let output_profile = config.get_str("output.profile").map(str::to_string);
        if let Some(name) = &output_profile {
            if !is_valid_profile_name(name) {
                return Err(ConfigError::InvalidProfileName(name.clone()));
            }
        }

        let name_prefix = required_str(config, "output.name_prefix")?;
        if output_profile.is_none() && !is_valid_profile_name(&name_prefix) {
            return Err(ConfigError::InvalidProfileName(name_prefix));
        }

        Ok(Self {
            registry,
            mode,
            inputs: input_selection(config)?,
            profile_glob: required_str(config, "inputs.profile_glob")?,
            output_path: config.get_str("output.path").map(PathBuf::from),
            output_profile,
            label: required_str(config, "output.label")?,
            author: required_str(config, "output.author")?,
            name_prefix,
        })
    }
}

fn required_str(config: &EffectiveConfig, key: &str) -> Result<String, ConfigError> {
    config
        .get_str(key)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            expected: "a string",
        })
}

fn input_selection(config: &EffectiveConfig) -> Result<InputSelection, ConfigError> {
    let paths = config.get_str_list("inputs.profile_paths")?;
    let profiles = config.get_str_list("inputs.profiles")?;
    let dir = config.get_str("inputs.profile_dir");

    match (paths.is_empty(), dir) {
        (false, Some(_)) => Err(ConfigError::ConflictingInputs),
        (false, None) => Ok(InputSelection::Files {
            paths: paths.into_iter().map(PathBuf::from).collect(),
            profiles,
        }),
        (true, Some(dir)) => Ok(InputSelection::Directory {
            dir: PathBuf::from(dir),
            profiles,
        }),
        (true, None) => Err(ConfigError::MissingInputs),
    }
}
