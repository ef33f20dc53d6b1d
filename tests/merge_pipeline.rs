//! End-to-end pipeline tests: configuration, input discovery, output.

mod fixtures;

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use fixtures::{profile_path, profiles_dir, registry_path, DESKTOP_A, DESKTOP_B, MOBILE};
use serde_json::{json, Value};
use tempfile::TempDir;
use vkprofiles_merge::{
    EffectiveConfig, InputError, InputSelection, MergeSettings, Pipeline, PipelineError,
};

fn settings(cli: Value) -> MergeSettings {
    EffectiveConfig::build(None, Some(cli))
        .expect("Failed to build config")
        .settings()
        .expect("Invalid settings")
}

fn fixed_now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(14, 7, 0)
        .unwrap()
}

fn read_json(path: &PathBuf) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_file_mode_writes_merged_document() {
    let out = TempDir::new().unwrap();
    let output_path = out.path().join("merged.json");
    let settings = settings(json!({
        "registry": registry_path(),
        "mode": "union",
        "inputs": {
            "profile_paths": [profile_path("desktop_a.json"), profile_path("desktop_b.json")],
            "profiles": [DESKTOP_A, DESKTOP_B]
        },
        "output": {"path": output_path, "profile": "VP_TEST_union"}
    }));

    let report = Pipeline::new(settings).with_now(fixed_now()).run().unwrap();

    assert_eq!(report.profile_name, "VP_TEST_union");
    assert_eq!(report.output_path, output_path);
    assert_eq!(report.inputs, vec![DESKTOP_A.to_string(), DESKTOP_B.to_string()]);
    assert!(report.diagnostics.is_empty());

    let written = read_json(&output_path);
    assert_eq!(
        written["$schema"],
        "https://schema.khronos.org/vulkan/profiles-0.8.1-230.json#"
    );
    let profile = &written["profiles"]["VP_TEST_union"];
    assert_eq!(profile["status"], "BETA");
    assert_eq!(profile["label"], "Merged profile");
    assert_eq!(profile["history"][0]["author"], "Merge tool");
    assert_eq!(profile["history"][0]["date"], "2024-03-01");

    let baseline = &written["capabilities"]["baseline"];
    assert_eq!(baseline["extensions"]["VK_KHR_swapchain"], 70);
    assert!(baseline["queueFamiliesProperties"].is_array());
    assert!(baseline["features"]["VkPhysicalDevice8BitStorageFeaturesKHR"].is_null());

    let text = fs::read_to_string(&output_path).unwrap();
    assert!(text.contains("\n    \"capabilities\": {\n        \"baseline\""));
}

#[test]
fn test_directory_mode_with_generated_name() {
    let out = TempDir::new().unwrap();
    let output_path = out.path().join("dir.json");
    let settings = settings(json!({
        "registry": registry_path(),
        "mode": "intersection",
        "inputs": {"profile_dir": profiles_dir(), "profiles": [MOBILE, DESKTOP_A]},
        "output": {"path": output_path}
    }));
    assert!(matches!(settings.inputs, InputSelection::Directory { .. }));

    let report = Pipeline::new(settings).with_now(fixed_now()).run().unwrap();

    assert_eq!(report.profile_name, "VP_LUNARG_merged_2024_03_01_14_07");
    let written = read_json(&output_path);
    let baseline = &written["capabilities"]["baseline"];
    // VP_TEST_desktop_a comes from desktop_a.json, which sorts before mobile.json.
    assert_eq!(baseline["extensions"], json!({"VK_KHR_swapchain": 70}));
    assert_eq!(
        baseline["properties"]["VkPhysicalDeviceProperties"]["limits"],
        json!({"maxImageDimension2D": 4096})
    );
    assert_eq!(
        written["profiles"]["VP_LUNARG_merged_2024_03_01_14_07"]["api-version"],
        "1.3.204"
    );
}

#[test]
fn test_default_output_path_is_profile_name() {
    let settings = settings(json!({
        "registry": registry_path(),
        "inputs": {
            "profile_paths": [profile_path("desktop_a.json"), profile_path("desktop_b.json")],
            "profiles": [DESKTOP_A, DESKTOP_B]
        },
        "output": {"profile": "VP_TEST_default_path"}
    }));
    assert_eq!(settings.output_path, None);

    let expected = PathBuf::from("VP_TEST_default_path.json");
    assert_eq!(
        vkprofiles_merge::output::output_path(
            settings.output_path.as_deref(),
            "VP_TEST_default_path"
        ),
        expected
    );
}

#[test]
fn test_missing_profiles_are_reported_together() {
    let out = TempDir::new().unwrap();
    let output_path = out.path().join("never.json");
    let settings = settings(json!({
        "registry": registry_path(),
        "inputs": {
            "profile_dir": profiles_dir(),
            "profiles": ["VP_TEST_x", DESKTOP_B, "VP_TEST_y"]
        },
        "output": {"path": output_path}
    }));

    let err = Pipeline::new(settings).run().unwrap_err();

    match &err {
        PipelineError::Input(InputError::ProfilesNotFound { profiles, .. }) => {
            assert_eq!(profiles, &vec!["VP_TEST_x".to_string(), "VP_TEST_y".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 4);
    assert!(!output_path.exists());
}

#[test]
fn test_profile_missing_from_file_fails_before_writing() {
    let out = TempDir::new().unwrap();
    let output_path = out.path().join("never.json");
    let settings = settings(json!({
        "registry": registry_path(),
        "inputs": {
            "profile_paths": [profile_path("desktop_a.json"), profile_path("desktop_b.json")],
            "profiles": [DESKTOP_B, DESKTOP_A]
        },
        "output": {"path": output_path}
    }));

    let err = Pipeline::new(settings).run().unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Input(InputError::ProfileNotFound { .. })
    ));
    assert!(!output_path.exists());
}

#[test]
fn test_config_file_layer() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("merge.toml");
    fs::write(
        &config_path,
        format!(
            "registry = {:?}\nmode = \"intersection\"\n\n[output]\nlabel = \"Desktop floor\"\nauthor = \"GPU team\"\n",
            registry_path().to_string_lossy()
        ),
    )
    .unwrap();
    let output_path = dir.path().join("out.json");

    let cli = json!({
        "inputs": {
            "profile_paths": [profile_path("desktop_a.json"), profile_path("desktop_b.json")],
            "profiles": [DESKTOP_A, DESKTOP_B]
        },
        "output": {"path": output_path, "profile": "VP_TEST_floor"}
    });
    let config = EffectiveConfig::build(Some(&config_path), Some(cli)).unwrap();
    let settings = config.settings().unwrap();

    Pipeline::new(settings).with_now(fixed_now()).run().unwrap();

    let written = read_json(&output_path);
    let profile = &written["profiles"]["VP_TEST_floor"];
    assert_eq!(profile["label"], "Desktop floor");
    assert_eq!(profile["history"][0]["author"], "GPU team");
    assert_eq!(
        written["capabilities"]["baseline"]["extensions"],
        json!({"VK_KHR_swapchain": 68})
    );
}

#[test]
fn test_unparseable_registry_is_fatal() {
    let dir = TempDir::new().unwrap();
    let registry = dir.path().join("registry.json");
    fs::write(
        &registry,
        r#"{"structs": {"VkPhysicalDeviceFeatures": {"definedByVersion": "one"}}}"#,
    )
    .unwrap();
    let output_path = dir.path().join("out.json");
    let settings = settings(json!({
        "registry": registry,
        "inputs": {
            "profile_paths": [profile_path("desktop_a.json"), profile_path("desktop_b.json")],
            "profiles": [DESKTOP_A, DESKTOP_B]
        },
        "output": {"path": output_path}
    }));

    let err = Pipeline::new(settings).run().unwrap_err();
    assert!(matches!(err, PipelineError::Registry(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(!output_path.exists());
}
