//! Layered configuration
//!
//! Settings are merged from three layers, last wins:
//! 1. Built-in defaults
//! 2. Config file (`--config`, else .vkprofiles/merge.toml when present)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, REPO_CONFIG_PATH};
pub use merge::{deep_merge, merge_layers};
pub use settings::{InputSelection, MergeSettings};
