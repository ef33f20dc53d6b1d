//! Typed model of a capability profiles document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Members of one struct, keyed by member name.
pub type FieldMap = Map<String, Value>;

/// Structs of one category, keyed by struct name.
pub type StructMap = BTreeMap<String, FieldMap>;

/// Format properties structs of one format (`VkFormatProperties`, ...).
pub type FormatEntry = BTreeMap<String, FormatFeatures>;

/// A complete profiles document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilesDocument {
    #[serde(rename = "$schema")]
    pub schema: String,

    #[serde(default)]
    pub capabilities: BTreeMap<String, CapabilityBlock>,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl ProfilesDocument {
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

/// A named bundle of capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityBlock {
    /// Extension name to spec version.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, u32>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: StructMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: StructMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub formats: BTreeMap<String, FormatEntry>,

    #[serde(
        default,
        rename = "queueFamiliesProperties",
        alias = "queueFamilies",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub queue_families: Vec<QueueFamilyEntry>,
}

impl CapabilityBlock {
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
            && self.features.is_empty()
            && self.properties.is_empty()
            && self.formats.is_empty()
            && self.queue_families.is_empty()
    }
}

/// Tiling feature sets of one format properties struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_tiling_features: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_tiling_features: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_features: Option<Vec<String>>,
}

/// Which of the three tiling feature sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilingSet {
    Linear,
    Optimal,
    Buffer,
}

impl TilingSet {
    pub const ALL: [TilingSet; 3] = [TilingSet::Linear, TilingSet::Optimal, TilingSet::Buffer];
}

impl FormatFeatures {
    pub fn set(&self, which: TilingSet) -> Option<&Vec<String>> {
        match which {
            TilingSet::Linear => self.linear_tiling_features.as_ref(),
            TilingSet::Optimal => self.optimal_tiling_features.as_ref(),
            TilingSet::Buffer => self.buffer_features.as_ref(),
        }
    }

    pub fn set_mut(&mut self, which: TilingSet) -> &mut Option<Vec<String>> {
        match which {
            TilingSet::Linear => &mut self.linear_tiling_features,
            TilingSet::Optimal => &mut self.optimal_tiling_features,
            TilingSet::Buffer => &mut self.buffer_features,
        }
    }

    /// True when every set is absent or empty.
    pub fn is_empty(&self) -> bool {
        TilingSet::ALL
            .iter()
            .all(|which| self.set(*which).map_or(true, Vec::is_empty))
    }
}

/// One queue family descriptor, with any chained structs kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueFamilyEntry {
    #[serde(
        default,
        rename = "VkQueueFamilyProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub properties: Option<QueueFamilyProperties>,

    #[serde(flatten)]
    pub chained: Map<String, Value>,
}

impl QueueFamilyEntry {
    /// Whether two descriptors name the same queue family. Only
    /// `VkQueueFamilyProperties` takes part; chained structs are ignored.
    pub fn same_family(&self, other: &Self) -> bool {
        self.properties == other.properties
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueFamilyProperties {
    #[serde(default)]
    pub queue_flags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_valid_bits: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_image_transfer_granularity: Option<Extent3D>,
}

impl PartialEq for QueueFamilyProperties {
    /// Flags compare as a multiset; everything else exactly.
    fn eq(&self, other: &Self) -> bool {
        let mut mine: Vec<&String> = self.queue_flags.iter().collect();
        let mut theirs: Vec<&String> = other.queue_flags.iter().collect();
        mine.sort();
        theirs.sort();
        mine == theirs
            && self.queue_count == other.queue_count
            && self.timestamp_valid_bits == other.timestamp_valid_bits
            && self.min_image_transfer_granularity == other.min_image_transfer_granularity
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// Metadata of one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_profile_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(rename = "api-version")]
    pub api_version: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub contributors: Map<String, Value>,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// Names of the capability blocks this profile requires.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_profile_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub revision: u32,
    pub date: String,
    pub author: String,
    pub comment: String,
}
