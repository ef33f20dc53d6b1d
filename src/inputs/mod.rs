//! Input discovery and loading
//!
//! File mode pairs each path with the profile to take from it. Directory
//! mode scans the top level of a directory for profile documents and takes
//! each requested profile from the first file (by name) that defines it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use tracing::{debug, warn};
use vkp_engine::{MergeInput, ProfilesDocument};
use walkdir::WalkDir;

use crate::config::InputSelection;

/// Minimum number of profiles a run merges.
pub const MIN_INPUTS: usize = 2;

/// Input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to scan {dir}: {source}")]
    Scan {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid profile glob: {0}")]
    Glob(#[from] globset::Error),

    #[error("At least two profiles are required, got {0}")]
    TooFewProfiles(usize),

    #[error("{paths} profile paths given for {profiles} profiles")]
    MismatchedPairs { paths: usize, profiles: usize },

    #[error("Profile {profile} not found in {path}")]
    ProfileNotFound { profile: String, path: PathBuf },

    #[error("Profiles not found in {dir}: {}", .profiles.join(", "))]
    ProfilesNotFound { dir: PathBuf, profiles: Vec<String> },
}

/// A parsed input file.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: ProfilesDocument,
}

/// Loaded documents and the ordered profile selections over them.
#[derive(Debug, Clone, Default)]
pub struct ResolvedInputs {
    documents: Vec<LoadedDocument>,
    /// (document index, profile name) in merge order.
    selections: Vec<(usize, String)>,
}

impl ResolvedInputs {
    /// Merge inputs borrowing from the loaded documents.
    pub fn merge_inputs(&self) -> Vec<MergeInput<'_>> {
        self.selections
            .iter()
            .map(|(idx, profile)| MergeInput::new(&self.documents[*idx].document, profile))
            .collect()
    }

    /// Source file of each selected profile, in merge order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.selections
            .iter()
            .map(|(idx, profile)| (profile.as_str(), self.documents[*idx].path.as_path()))
    }
}

/// Read and parse one profiles document.
pub fn load_document(path: &Path) -> Result<ProfilesDocument, InputError> {
    let contents = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ProfilesDocument::from_json_str(&contents).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the configured input selection.
pub fn resolve(
    selection: &InputSelection,
    profile_glob: &str,
) -> Result<ResolvedInputs, InputError> {
    let count = selection.profiles().len();
    if count < MIN_INPUTS {
        return Err(InputError::TooFewProfiles(count));
    }
    match selection {
        InputSelection::Files { paths, profiles } => from_files(paths, profiles),
        InputSelection::Directory { dir, profiles } => from_directory(dir, profiles, profile_glob),
    }
}

/// Pair each path with the profile at the same position.
pub fn from_files(paths: &[PathBuf], profiles: &[String]) -> Result<ResolvedInputs, InputError> {
    if paths.len() != profiles.len() {
        return Err(InputError::MismatchedPairs {
            paths: paths.len(),
            profiles: profiles.len(),
        });
    }

    let mut resolved = ResolvedInputs::default();
    for (path, profile) in paths.iter().zip(profiles) {
        let document = load_document(path)?;
        if !document.profiles.contains_key(profile) {
            return Err(InputError::ProfileNotFound {
                profile: profile.clone(),
                path: path.clone(),
            });
        }
        // The same file may be listed twice; parse it once.
        let idx = match resolved.documents.iter().position(|d| d.path == *path) {
            Some(idx) => idx,
            None => {
                resolved.documents.push(LoadedDocument {
                    path: path.clone(),
                    document,
                });
                resolved.documents.len() - 1
            }
        };
        resolved.selections.push((idx, profile.clone()));
    }
    Ok(resolved)
}

/// Find each requested profile among the files of `dir` matching `glob`.
pub fn from_directory(
    dir: &Path,
    profiles: &[String],
    glob: &str,
) -> Result<ResolvedInputs, InputError> {
    let matcher = Glob::new(glob)?.compile_matcher();
    let mut resolved = ResolvedInputs::default();

    for path in candidate_files(dir, &matcher)? {
        let document = match load_document(&path) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable profile file");
                continue;
            }
        };
        debug!(path = %path.display(), profiles = document.profiles.len(), "scanned");
        resolved.documents.push(LoadedDocument { path, document });
    }

    let mut missing = Vec::new();
    for profile in profiles {
        let found = resolved
            .documents
            .iter()
            .position(|loaded| loaded.document.profiles.contains_key(profile));
        match found {
            Some(idx) => resolved.selections.push((idx, profile.clone())),
            None => missing.push(profile.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(InputError::ProfilesNotFound {
            dir: dir.to_path_buf(),
            profiles: missing,
        });
    }
    Ok(resolved)
}

/// Top-level files of `dir` whose names match, sorted by file name.
fn candidate_files(dir: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>, InputError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry.map_err(|source| InputError::Scan {
            dir: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
