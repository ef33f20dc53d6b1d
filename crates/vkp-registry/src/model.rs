//! Registry data model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RegistryError;
use crate::limit::LimitType;

/// Core API version that defines a struct (`major.minor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidVersion(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for VersionNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A struct known to the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructDef {
    /// Alternate names for the same struct.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Core version that introduced the struct, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_by_version: Option<VersionNumber>,

    /// Extensions that introduced the struct.
    #[serde(default)]
    pub defined_by_extensions: Vec<String>,

    /// Members keyed by name.
    #[serde(default)]
    pub members: BTreeMap<String, MemberDef>,
}

impl StructDef {
    /// A struct introduced by a core version.
    pub fn core(major: u32, minor: u32) -> Self {
        Self {
            defined_by_version: Some(VersionNumber::new(major, minor)),
            ..Self::default()
        }
    }

    /// A struct introduced by an extension.
    pub fn extension(name: impl Into<String>) -> Self {
        Self {
            defined_by_extensions: vec![name.into()],
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.defined_by_extensions.push(extension.into());
        self
    }

    pub fn with_member(mut self, name: impl Into<String>, member: MemberDef) -> Self {
        self.members.insert(name.into(), member);
        self
    }
}

/// A struct member and its merge classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDef {
    /// Declared C type (`VkBool32`, `uint32_t`, `VkExtent2D`, ...).
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limittype: Option<LimitType>,

    /// Fixed array length for vector members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_size: Option<u32>,
}

impl MemberDef {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            limittype: None,
            array_size: None,
        }
    }

    pub fn limit(mut self, raw: &str) -> Self {
        self.limittype = Some(LimitType::parse(raw));
        self
    }

    pub fn array(mut self, size: u32) -> Self {
        self.array_size = Some(size);
        self
    }

    /// Whether the member is a single on/off switch.
    pub fn is_bool(&self) -> bool {
        self.ty == "VkBool32"
    }
}

/// An extension known to the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDef {
    /// Core version or extension this extension was promoted to
    /// (e.g. `VK_VERSION_1_2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_to: Option<String>,
}

impl ExtensionDef {
    /// Core version the extension was promoted to, if it was promoted to core.
    pub fn promoted_version(&self) -> Option<VersionNumber> {
        let rest = self.promoted_to.as_deref()?.strip_prefix("VK_VERSION_")?;
        let (major, minor) = rest.split_once('_')?;
        Some(VersionNumber::new(major.parse().ok()?, minor.parse().ok()?))
    }
}

/// Vendor tag of an extension name (`VK_EXT_foo` -> `EXT`).
pub fn vendor_tag(extension: &str) -> Option<&str> {
    extension.split('_').nth(1)
}
