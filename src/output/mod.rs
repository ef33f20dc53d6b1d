//! Output naming and writing
//!
//! Profile names must start with `VP_` followed by an upper-case letter or
//! digit. When no name is given one is generated from a prefix and the
//! current time, and the output path defaults to `<name>.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex_lite::Regex;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use vkp_engine::ProfilesDocument;

/// Leading part every profile name must match.
pub const PROFILE_NAME_PATTERN: &str = r"^VP_[A-Z0-9][A-Za-z0-9]*";

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to serialize merged document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn profile_name_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(PROFILE_NAME_PATTERN).ok())
        .as_ref()
}

/// Whether `name` starts with a valid profile name.
pub fn is_valid_profile_name(name: &str) -> bool {
    profile_name_regex().is_some_and(|re| re.is_match(name))
}

/// `<prefix>_YYYY_MM_DD_HH_MM`
pub fn generated_profile_name(prefix: &str, now: NaiveDateTime) -> String {
    format!("{}_{}", prefix, now.format("%Y_%m_%d_%H_%M"))
}

/// The explicit output path, else `<profile>.json` in the working directory.
pub fn output_path(explicit: Option<&Path>, profile: &str) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(format!("{}.json", profile)),
    }
}

/// Serialize with 4-space indentation and a trailing newline.
pub fn to_pretty_json(document: &ProfilesDocument) -> Result<Vec<u8>, OutputError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write the merged document, creating parent directories as needed.
pub fn write_document(path: &Path, document: &ProfilesDocument) -> Result<(), OutputError> {
    let bytes = to_pretty_json(document)?;
    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}
