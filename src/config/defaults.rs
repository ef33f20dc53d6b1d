//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};
use vkp_engine::{DEFAULT_AUTHOR, DEFAULT_LABEL};

/// Prefix of auto-generated output profile names.
pub const DEFAULT_NAME_PREFIX: &str = "VP_LUNARG_merged";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Merge mode (default: "union")
    pub mode: String,

    /// Files considered in directory mode (default: "*.json")
    pub profile_glob: String,

    /// Label of the generated profile
    pub label: String,

    /// Author recorded in the generated history entry
    pub author: String,

    /// Prefix used when no output profile name is given
    pub name_prefix: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            mode: "union".to_string(),
            profile_glob: "*.json".to_string(),
            label: DEFAULT_LABEL.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "mode": self.mode,
            "inputs": {
                "profile_glob": self.profile_glob
            },
            "output": {
                "label": self.label,
                "author": self.author,
                "name_prefix": self.name_prefix
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.mode, "union");
        assert_eq!(defaults.profile_glob, "*.json");
        assert_eq!(defaults.label, "Merged profile");
        assert_eq!(defaults.author, "Merge tool");
        assert_eq!(defaults.name_prefix, "VP_LUNARG_merged");
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["mode"], "union");
        assert_eq!(value["inputs"]["profile_glob"], "*.json");
        assert_eq!(value["output"]["name_prefix"], "VP_LUNARG_merged");
        assert!(value.get("registry").is_none());
    }
}
