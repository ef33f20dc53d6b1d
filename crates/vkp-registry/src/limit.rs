//! Per-member limit type classification.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How two values of the same member are combined.
///
/// The registry stores the classification as a comma-separated attribute
/// (`"max"`, `"pot,max"`, `"min,mul"`, ...). Modifiers such as `pot` and
/// `mul` describe value constraints and do not change the combination rule,
/// so any list naming `max` is [`LimitType::Max`] and any list naming `min`
/// is [`LimitType::Min`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LimitType {
    /// Values must be identical in every input.
    Exact,
    /// Upper bound the implementation guarantees.
    Max,
    /// Lower bound the implementation guarantees.
    Min,
    /// Bit width; behaves like `Max`.
    Bits,
    /// Set of flags (or a single `VkBool32` switch).
    Bitmask,
    /// Two-element `[low, high]` interval.
    Range,
    /// Not automatically combinable.
    NoAuto,
    /// Nested struct merged member by member.
    Struct,
    /// Classification the merge engine does not understand.
    Unknown(String),
}

impl LimitType {
    /// Parse a registry `limittype` attribute.
    pub fn parse(raw: &str) -> Self {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.contains(&"max") {
            return LimitType::Max;
        }
        if parts.contains(&"min") {
            return LimitType::Min;
        }
        match raw.trim() {
            "exact" => LimitType::Exact,
            "bits" => LimitType::Bits,
            "bitmask" => LimitType::Bitmask,
            "range" => LimitType::Range,
            "noauto" => LimitType::NoAuto,
            "struct" => LimitType::Struct,
            other => LimitType::Unknown(other.to_string()),
        }
    }

    /// Registry spelling of this classification.
    pub fn as_str(&self) -> &str {
        match self {
            LimitType::Exact => "exact",
            LimitType::Max => "max",
            LimitType::Min => "min",
            LimitType::Bits => "bits",
            LimitType::Bitmask => "bitmask",
            LimitType::Range => "range",
            LimitType::NoAuto => "noauto",
            LimitType::Struct => "struct",
            LimitType::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for LimitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LimitType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LimitType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(LimitType::parse("exact"), LimitType::Exact);
        assert_eq!(LimitType::parse("bitmask"), LimitType::Bitmask);
        assert_eq!(LimitType::parse("range"), LimitType::Range);
        assert_eq!(LimitType::parse("noauto"), LimitType::NoAuto);
        assert_eq!(LimitType::parse("bits"), LimitType::Bits);
        assert_eq!(LimitType::parse("struct"), LimitType::Struct);
    }

    #[test]
    fn test_parse_modifiers() {
        assert_eq!(LimitType::parse("pot,max"), LimitType::Max);
        assert_eq!(LimitType::parse("min,mul"), LimitType::Min);
        assert_eq!(LimitType::parse("min, pot"), LimitType::Min);
    }

    #[test]
    fn test_parse_unknown_keeps_raw() {
        let limit = LimitType::parse("pot");
        assert_eq!(limit, LimitType::Unknown("pot".to_string()));
        assert_eq!(limit.to_string(), "pot");
    }

    #[test]
    fn test_serde_uses_registry_spelling() {
        let limit: LimitType = serde_json::from_str("\"mul,max\"").unwrap();
        assert_eq!(limit, LimitType::Max);
        assert_eq!(serde_json::to_string(&LimitType::Range).unwrap(), "\"range\"");
    }
}
