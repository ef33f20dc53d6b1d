//! Effective configuration with provenance
//!
//! The effective config is the merged JSON value of every layer plus the
//! list of sources that contributed to it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use vkp_engine::ParseModeError;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::settings::MergeSettings;

/// Config file picked up from the working directory when `--config` is not given.
pub const REPO_CONFIG_PATH: &str = ".vkprofiles/merge.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Merged configuration of all layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build the effective config from the optional file layer and CLI overrides
    pub fn build(
        config_file: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        if let Some(path) = config_file {
            layers.push(Self::load_toml_file(path)?);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        for source in &sources {
            debug!(origin = ?source.origin, path = ?source.path, "config layer");
        }

        Ok(Self {
            config: merge_layers(layers),
            sources,
        })
    }

    /// Config file to load: the explicit path, else the repo config under
    /// `root` when it exists.
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let candidate = root.join(REPO_CONFIG_PATH);
        candidate.is_file().then_some(candidate)
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

        Ok(Self::toml_to_json(toml_value))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Typed settings for a merge run
    pub fn settings(&self) -> Result<MergeSettings, ConfigError> {
        MergeSettings::from_config(self)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        // An explicit null (e.g. an unset CLI flag) reads as absent.
        (!current.is_null()).then_some(current)
    }

    /// Get a config value as string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    /// Get a config value as a list of strings. A single string reads as a
    /// one-element list.
    pub fn get_str_list(&self, path: &str) -> Result<Vec<String>, ConfigError> {
        match self.get(path) {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| ConfigError::InvalidValue {
                        key: path.to_string(),
                        expected: "a list of strings",
                    })
                })
                .collect(),
            Some(_) => Err(ConfigError::InvalidValue {
                key: path.to_string(),
                expected: "a list of strings",
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Registry path is required (--registry or `registry` in the config file)")]
    MissingRegistry,

    #[error(transparent)]
    InvalidMode(#[from] ParseModeError),

    #[error("Invalid profile name '{0}': must match VP_[A-Z0-9][A-Za-z0-9]*")]
    InvalidProfileName(String),

    #[error("Config key '{key}' must be {expected}")]
    InvalidValue { key: String, expected: &'static str },

    #[error("No inputs: give --profile-path/--profile pairs or --profile-dir with --profile")]
    MissingInputs,

    #[error("--profile-path and --profile-dir cannot be used together")]
    ConflictingInputs,
}
