//! Merge orchestration.
//!
//! Inputs are folded in order. Each input first collapses the capability
//! blocks its profile declares into one view (a union, reconciled like any
//! other merge), then that view is folded into the run accumulator under the
//! requested mode. The result is a new document with a single `baseline`
//! block and one generated profile.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};
use vkp_registry::Registry;

use crate::blocks::BlockMerger;
use crate::context::MergeContext;
use crate::diagnostics::{DiagnosticKind, Diagnostics, MergeDiagnostic};
use crate::document::{CapabilityBlock, HistoryEntry, Profile, ProfilesDocument};
use crate::mode::{MergeMode, MergeStep};
use crate::version::{select_highest, ApiVersion, SchemaVersion};

/// Name of the capability block of a merged document.
pub const BASELINE_BLOCK: &str = "baseline";

pub const DEFAULT_LABEL: &str = "Merged profile";
pub const DEFAULT_AUTHOR: &str = "Merge tool";

const MERGED_STATUS: &str = "BETA";

/// Fatal merge errors. Nothing is produced when one is returned.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("No input profiles to merge")]
    NoInputs,

    #[error("Profile {0} not found in its input document")]
    ProfileNotFound(String),

    #[error("Unrecognized $schema: {0}")]
    InvalidSchema(String),

    #[error("Profile {profile} has an unrecognized api-version: {value}")]
    InvalidApiVersion { profile: String, value: String },
}

/// One input of a merge: a document and the profile selected from it.
#[derive(Debug, Clone, Copy)]
pub struct MergeInput<'a> {
    pub document: &'a ProfilesDocument,
    pub profile: &'a str,
}

impl<'a> MergeInput<'a> {
    pub fn new(document: &'a ProfilesDocument, profile: &'a str) -> Self {
        Self { document, profile }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub mode: MergeMode,
    /// Name of the generated profile.
    pub profile_name: String,
    pub label: String,
    pub author: String,
    /// Date recorded in the generated history entry.
    pub date: NaiveDate,
}

impl MergeOptions {
    pub fn new(mode: MergeMode, profile_name: impl Into<String>) -> Self {
        Self {
            mode,
            profile_name: profile_name.into(),
            label: DEFAULT_LABEL.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            date: Local::now().date_naive(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: ProfilesDocument,
    pub diagnostics: Vec<MergeDiagnostic>,
}

/// Drives one merge run.
///
/// Struct identity lookups are memoized inside the merger, so a merger should
/// not outlive the run it was created for.
pub struct ProfileMerger<'r> {
    blocks: BlockMerger<'r>,
}

impl<'r> ProfileMerger<'r> {
    pub fn new(registry: &'r dyn Registry) -> Self {
        Self {
            blocks: BlockMerger::new(registry),
        }
    }

    pub fn merge(
        mut self,
        inputs: &[MergeInput<'_>],
        options: &MergeOptions,
    ) -> Result<MergeOutcome, MergeError> {
        if inputs.is_empty() {
            return Err(MergeError::NoInputs);
        }

        let profiles = inputs
            .iter()
            .map(|input| {
                input
                    .document
                    .profiles
                    .get(input.profile)
                    .ok_or_else(|| MergeError::ProfileNotFound(input.profile.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let schema = select_schema(inputs)?;
        let api_version = select_api_version(inputs, &profiles)?;
        debug!(%schema, %api_version, "selected versions");

        let mut context = MergeContext::new(options.mode);
        for (input, profile) in inputs.iter().zip(&profiles) {
            info!(profile = %input.profile, mode = %context.mode(), "merging profile");
            let view = self.collect_view(input, profile, context.diagnostics_mut());
            context.fold(&mut self.blocks, &view);
        }
        let (baseline, diagnostics) = context.finish();

        let names: Vec<&str> = inputs.iter().map(|input| input.profile).collect();
        let description = describe(options.mode, &names);
        let profile = Profile {
            version: 1,
            status: Some(MERGED_STATUS.to_string()),
            api_version,
            label: options.label.clone(),
            description: description.clone(),
            contributors: Default::default(),
            history: vec![HistoryEntry {
                revision: 1,
                date: options.date.format("%Y-%m-%d").to_string(),
                author: options.author.clone(),
                comment: description,
            }],
            capabilities: vec![BASELINE_BLOCK.to_string()],
        };

        let document = ProfilesDocument {
            schema,
            capabilities: BTreeMap::from([(BASELINE_BLOCK.to_string(), baseline)]),
            profiles: BTreeMap::from([(options.profile_name.clone(), profile)]),
        };

        Ok(MergeOutcome {
            document,
            diagnostics: diagnostics.into_vec(),
        })
    }

    /// Union of the capability blocks one profile declares.
    fn collect_view(
        &mut self,
        input: &MergeInput<'_>,
        profile: &Profile,
        diagnostics: &mut Diagnostics,
    ) -> CapabilityBlock {
        let mut view = CapabilityBlock::default();
        for name in &profile.capabilities {
            match input.document.capabilities.get(name) {
                Some(block) => {
                    view = self
                        .blocks
                        .merge(view, block, MergeStep::combine(), diagnostics);
                }
                None => diagnostics.report(
                    format!("{}:{}", input.profile, name),
                    DiagnosticKind::MissingCapabilityBlock,
                ),
            }
        }
        view
    }
}

/// Merge `inputs` in order with a fresh [`ProfileMerger`].
pub fn merge_profiles(
    registry: &dyn Registry,
    inputs: &[MergeInput<'_>],
    options: &MergeOptions,
) -> Result<MergeOutcome, MergeError> {
    ProfileMerger::new(registry).merge(inputs, options)
}

fn select_schema(inputs: &[MergeInput<'_>]) -> Result<String, MergeError> {
    let versions = inputs
        .iter()
        .map(|input| {
            let raw = &input.document.schema;
            SchemaVersion::from_schema_url(raw)
                .map(|version| (version, raw))
                .ok_or_else(|| MergeError::InvalidSchema(raw.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    select_highest(versions)
        .cloned()
        .ok_or(MergeError::NoInputs)
}

fn select_api_version(
    inputs: &[MergeInput<'_>],
    profiles: &[&Profile],
) -> Result<String, MergeError> {
    let versions = inputs
        .iter()
        .zip(profiles)
        .map(|(input, profile)| {
            let raw = &profile.api_version;
            ApiVersion::parse(raw)
                .map(|version| (version, raw))
                .ok_or_else(|| MergeError::InvalidApiVersion {
                    profile: input.profile.to_string(),
                    value: raw.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    select_highest(versions)
        .cloned()
        .ok_or(MergeError::NoInputs)
}

/// `Generated profile doing a union between profiles: A, B and C`.
pub fn describe(mode: MergeMode, names: &[&str]) -> String {
    let mut listed = String::new();
    for (i, name) in names.iter().enumerate() {
        listed.push_str(name);
        if i + 2 == names.len() {
            listed.push_str(" and ");
        } else if i + 2 < names.len() {
            listed.push_str(", ");
        }
    }
    format!(
        "Generated profile doing {} between profiles: {}",
        mode.with_article(),
        listed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vkp_registry::{MemberDef, RegistrySnapshot, StructDef};

    const SCHEMA_204: &str = "https://schema.khronos.org/vulkan/profiles-0.8.1-204.json#";
    const SCHEMA_230: &str = "https://schema.khronos.org/vulkan/profiles-0.8.1-230.json#";

    fn registry() -> RegistrySnapshot {
        RegistrySnapshot::default().with_struct(
            "VkPhysicalDeviceProperties",
            StructDef::core(1, 0)
                .with_member("maxImageDimension2D", MemberDef::new("uint32_t").limit("max"))
                .with_member("minMemoryMapAlignment", MemberDef::new("size_t").limit("min"))
                .with_member("deviceType", MemberDef::new("VkPhysicalDeviceType").limit("noauto")),
        )
    }

    fn document(
        schema: &str,
        profile: &str,
        api: &str,
        blocks: serde_json::Value,
    ) -> ProfilesDocument {
        let names: Vec<String> = blocks
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        serde_json::from_value(json!({
            "$schema": schema,
            "capabilities": blocks,
            "profiles": {profile: {"api-version": api, "capabilities": names}}
        }))
        .unwrap()
    }

    fn options(mode: MergeMode) -> MergeOptions {
        MergeOptions::new(mode, "VP_TEST_merged")
            .with_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn limits(value: u64) -> serde_json::Value {
        json!({"block": {"properties": {"VkPhysicalDeviceProperties": {
            "maxImageDimension2D": value,
            "minMemoryMapAlignment": 64,
            "deviceType": "VK_PHYSICAL_DEVICE_TYPE_DISCRETE_GPU"
        }}}})
    }

    #[test]
    fn test_union_and_intersection_of_max_limit() {
        let registry = registry();
        let a = document(SCHEMA_204, "VP_A", "1.3.204", limits(4));
        let b = document(SCHEMA_230, "VP_B", "1.2.198", limits(8));
        let inputs = [MergeInput::new(&a, "VP_A"), MergeInput::new(&b, "VP_B")];

        let union = merge_profiles(&registry, &inputs, &options(MergeMode::Union)).unwrap();
        let baseline = &union.document.capabilities[BASELINE_BLOCK];
        let props = &baseline.properties["VkPhysicalDeviceProperties"];
        assert_eq!(props["maxImageDimension2D"], json!(8));
        assert!(!props.contains_key("deviceType"));

        let intersection =
            merge_profiles(&registry, &inputs, &options(MergeMode::Intersection)).unwrap();
        let baseline = &intersection.document.capabilities[BASELINE_BLOCK];
        assert_eq!(
            baseline.properties["VkPhysicalDeviceProperties"]["maxImageDimension2D"],
            json!(4)
        );
    }

    #[test]
    fn test_generated_metadata() {
        let registry = registry();
        let a = document(SCHEMA_204, "VP_A", "1.3.204", limits(4));
        let b = document(SCHEMA_230, "VP_B", "1.2.198", limits(8));
        let inputs = [MergeInput::new(&a, "VP_A"), MergeInput::new(&b, "VP_B")];

        let outcome = merge_profiles(&registry, &inputs, &options(MergeMode::Union)).unwrap();
        let document = outcome.document;
        assert_eq!(document.schema, SCHEMA_230);
        assert_eq!(document.capabilities.len(), 1);

        let profile = &document.profiles["VP_TEST_merged"];
        assert_eq!(profile.api_version, "1.3.204");
        assert_eq!(profile.version, 1);
        assert_eq!(profile.status.as_deref(), Some("BETA"));
        assert_eq!(profile.label, DEFAULT_LABEL);
        assert_eq!(
            profile.description,
            "Generated profile doing a union between profiles: VP_A and VP_B"
        );
        assert_eq!(profile.history.len(), 1);
        assert_eq!(profile.history[0].date, "2024-03-01");
        assert_eq!(profile.history[0].author, DEFAULT_AUTHOR);
        assert_eq!(profile.capabilities, vec![BASELINE_BLOCK.to_string()]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(MergeMode::Intersection, &["A", "B", "C"]),
            "Generated profile doing an intersection between profiles: A, B and C"
        );
        assert_eq!(
            describe(MergeMode::Union, &["A"]),
            "Generated profile doing a union between profiles: A"
        );
    }

    #[test]
    fn test_blocks_of_one_input_are_combined_before_narrowing() {
        let registry = registry();
        let a = document(
            SCHEMA_204,
            "VP_A",
            "1.3.204",
            json!({
                "exts": {"extensions": {"VK_KHR_swapchain": 70}},
                "more": {"extensions": {"VK_KHR_maintenance1": 2}}
            }),
        );
        let b = document(
            SCHEMA_204,
            "VP_B",
            "1.3.204",
            json!({"all": {"extensions": {"VK_KHR_swapchain": 70, "VK_KHR_maintenance1": 1}}}),
        );
        let inputs = [MergeInput::new(&a, "VP_A"), MergeInput::new(&b, "VP_B")];

        let outcome =
            merge_profiles(&registry, &inputs, &options(MergeMode::Intersection)).unwrap();
        let extensions = &outcome.document.capabilities[BASELINE_BLOCK].extensions;
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions["VK_KHR_maintenance1"], 1);
    }

    #[test]
    fn test_missing_block_is_reported() {
        let registry = registry();
        let mut a = document(SCHEMA_204, "VP_A", "1.3.204", limits(4));
        if let Some(profile) = a.profiles.get_mut("VP_A") {
            profile.capabilities.push("absent".into());
        }
        let inputs = [MergeInput::new(&a, "VP_A")];

        let outcome = merge_profiles(&registry, &inputs, &options(MergeMode::Union)).unwrap();
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].to_code(),
            "MISSING_CAPABILITY_BLOCK:VP_A:absent"
        );
    }

    #[test]
    fn test_fatal_errors() {
        let registry = registry();
        let a = document(SCHEMA_204, "VP_A", "1.3.204", limits(4));
        let bad_api = document(SCHEMA_204, "VP_B", "latest", limits(4));
        let bad_schema = document("profiles.json", "VP_C", "1.3.204", limits(4));
        let opts = options(MergeMode::Union);

        assert!(matches!(
            merge_profiles(&registry, &[], &opts),
            Err(MergeError::NoInputs)
        ));
        assert!(matches!(
            merge_profiles(&registry, &[MergeInput::new(&a, "VP_Z")], &opts),
            Err(MergeError::ProfileNotFound(name)) if name == "VP_Z"
        ));
        assert!(matches!(
            merge_profiles(&registry, &[MergeInput::new(&bad_api, "VP_B")], &opts),
            Err(MergeError::InvalidApiVersion { .. })
        ));
        assert!(matches!(
            merge_profiles(&registry, &[MergeInput::new(&bad_schema, "VP_C")], &opts),
            Err(MergeError::InvalidSchema(_))
        ));
    }

    mod properties {
        use super::*;
        use crate::document::TilingSet;
        use proptest::prelude::*;

        const FLAGS: [&str; 4] = [
            "VK_FORMAT_FEATURE_SAMPLED_IMAGE_BIT",
            "VK_FORMAT_FEATURE_BLIT_SRC_BIT",
            "VK_FORMAT_FEATURE_BLIT_DST_BIT",
            "VK_FORMAT_FEATURE_TRANSFER_SRC_BIT",
        ];
        const EXTENSIONS: [&str; 3] =
            ["VK_KHR_swapchain", "VK_KHR_maintenance1", "VK_EXT_robustness2"];

        fn sample(name: &str, max: u32, flags: &[&str], extensions: &[&str]) -> ProfilesDocument {
            let extensions: serde_json::Map<String, serde_json::Value> =
                extensions.iter().map(|e| (e.to_string(), json!(1))).collect();
            document(
                SCHEMA_204,
                name,
                "1.3.204",
                json!({"block": {
                    "extensions": extensions,
                    "properties": {"VkPhysicalDeviceProperties": {"maxImageDimension2D": max}},
                    "formats": {"VK_FORMAT_R8_UNORM": {"VkFormatProperties": {
                        "optimalTilingFeatures": flags
                    }}}
                }}),
            )
        }

        fn sorted(mut block: CapabilityBlock) -> CapabilityBlock {
            for entry in block.formats.values_mut() {
                for features in entry.values_mut() {
                    for which in TilingSet::ALL {
                        if let Some(flags) = features.set_mut(which) {
                            flags.sort();
                        }
                    }
                }
            }
            block
        }

        fn baseline(inputs: &[MergeInput<'_>], mode: MergeMode) -> CapabilityBlock {
            let registry = RegistrySnapshot::default().with_struct(
                "VkPhysicalDeviceProperties",
                StructDef::core(1, 0)
                    .with_member("maxImageDimension2D", MemberDef::new("uint32_t").limit("max")),
            );
            let mut outcome = merge_profiles(&registry, inputs, &options(mode)).unwrap();
            outcome
                .document
                .capabilities
                .remove(BASELINE_BLOCK)
                .unwrap_or_default()
        }

        fn flag_sets() -> impl Strategy<Value = Vec<&'static str>> {
            proptest::sample::subsequence(FLAGS.to_vec(), 1..=FLAGS.len())
        }

        fn extension_sets() -> impl Strategy<Value = Vec<&'static str>> {
            proptest::sample::subsequence(EXTENSIONS.to_vec(), 0..=EXTENSIONS.len())
        }

        proptest! {
            #[test]
            fn prop_merge_with_self_is_identity(
                max in 0u32..65536,
                flags in flag_sets(),
                extensions in extension_sets(),
            ) {
                let a = sample("VP_A", max, &flags, &extensions);
                let expected = a.capabilities["block"].clone();
                let inputs = [MergeInput::new(&a, "VP_A"), MergeInput::new(&a, "VP_A")];
                for mode in [MergeMode::Union, MergeMode::Intersection] {
                    prop_assert_eq!(baseline(&inputs, mode), expected.clone());
                }
            }

            #[test]
            fn prop_two_input_merge_is_commutative(
                max_a in 0u32..65536,
                max_b in 0u32..65536,
                flags_a in flag_sets(),
                flags_b in flag_sets(),
                ext_a in extension_sets(),
                ext_b in extension_sets(),
            ) {
                let a = sample("VP_A", max_a, &flags_a, &ext_a);
                let b = sample("VP_B", max_b, &flags_b, &ext_b);
                let ab = [MergeInput::new(&a, "VP_A"), MergeInput::new(&b, "VP_B")];
                let ba = [MergeInput::new(&b, "VP_B"), MergeInput::new(&a, "VP_A")];
                for mode in [MergeMode::Union, MergeMode::Intersection] {
                    prop_assert_eq!(sorted(baseline(&ab, mode)), sorted(baseline(&ba, mode)));
                }
            }
        }
    }
}
