//! Shared fixtures for the merge integration tests
//!
//! - A registry snapshot covering feature, property and limit structs
//! - Two desktop profiles documents and a mobile one under profiles/

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use vkp_engine::ProfilesDocument;
use vkp_registry::RegistrySnapshot;

pub const DESKTOP_A: &str = "VP_TEST_desktop_a";
pub const DESKTOP_B: &str = "VP_TEST_desktop_b";
pub const MOBILE: &str = "VP_TEST_mobile";

/// Path to the registry snapshot fixture
pub fn registry_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/registry.json")
}

/// Directory holding the profiles fixtures
pub fn profiles_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/profiles")
}

/// Path to one profiles fixture
pub fn profile_path(file: &str) -> PathBuf {
    profiles_dir().join(file)
}

pub fn load_registry() -> RegistrySnapshot {
    RegistrySnapshot::from_file(&registry_path()).expect("Failed to load registry fixture")
}

pub fn load_profiles(file: &str) -> ProfilesDocument {
    let content =
        std::fs::read_to_string(profile_path(file)).expect("Failed to read profiles fixture");
    ProfilesDocument::from_json_str(&content).expect("Failed to parse profiles fixture")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_fixture_loads() {
        let registry = load_registry();
        assert!(registry.struct_count() >= 10);
    }

    #[test]
    fn test_profiles_fixtures_load() {
        assert!(load_profiles("desktop_a.json").profiles.contains_key(DESKTOP_A));
        assert!(load_profiles("desktop_b.json").profiles.contains_key(DESKTOP_B));
        assert!(load_profiles("mobile.json").profiles.contains_key(MOBILE));
    }
}
