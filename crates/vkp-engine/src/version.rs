//! Schema and API version selection.
//!
//! The merged document carries the highest `$schema` and `api-version` of its
//! inputs. Versions compare component-wise from the left; on a tie the first
//! input keeps its original string.

use std::fmt;

/// Marker preceding the version in a profiles schema URL.
const SCHEMA_NEEDLE: &str = "profiles-";

/// `major.minor.patch-revision` embedded in a schema URL such as
/// `https://schema.khronos.org/vulkan/profiles-0.8.1-204.json#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub revision: u32,
}

impl SchemaVersion {
    pub fn from_schema_url(url: &str) -> Option<Self> {
        let start = url.rfind(SCHEMA_NEEDLE)? + SCHEMA_NEEDLE.len();
        let (dotted, tail) = url[start..].split_once('-')?;
        let mut parts = dotted.split('.').map(|p| p.parse::<u32>().ok());
        let major = parts.next()??;
        let minor = parts.next()??;
        let patch = parts.next()??;
        if parts.next().is_some() {
            return None;
        }
        let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
        Some(Self {
            major,
            minor,
            patch,
            revision: digits.parse().ok()?,
        })
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}-{}", self.major, self.minor, self.patch, self.revision)
    }
}

/// Profile `api-version` such as `1.3.204`.
///
/// A trailing `-variant` suffix is accepted and ignored for ordering; a
/// missing patch component reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let core = raw.trim().split('-').next()?;
        let mut parts = core.split('.').map(|p| p.parse::<u32>().ok());
        let major = parts.next()??;
        let minor = parts.next()??;
        let patch = match parts.next() {
            Some(p) => p?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Pick the candidate with the highest key, keeping the earliest on ties.
pub fn select_highest<T, K: Ord>(candidates: impl IntoIterator<Item = (K, T)>) -> Option<T> {
    let mut best: Option<(K, T)> = None;
    for (key, item) in candidates {
        let replace = match &best {
            Some((best_key, _)) => key > *best_key,
            None => true,
        };
        if replace {
            best = Some((key, item));
        }
    }
    best.map(|(_, item)| item)
}
