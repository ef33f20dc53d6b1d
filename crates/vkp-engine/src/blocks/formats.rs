use std::collections::BTreeMap;

use tracing::debug;

use crate::document::{FormatEntry, FormatFeatures, TilingSet};
use crate::mode::{MergeMode, MergeStep};

/// Merge format capability maps.
///
/// Formats, their properties structs and their tiling feature sets are
/// matched by name. Within a matched set, union appends missing flags and
/// intersection keeps the common ones. Sets, structs and formats left empty
/// are pruned.
pub fn merge_formats(
    accumulated: BTreeMap<String, FormatEntry>,
    incoming: &BTreeMap<String, FormatEntry>,
    step: MergeStep,
) -> BTreeMap<String, FormatEntry> {
    let mut merged = BTreeMap::new();

    for (format, entry) in accumulated {
        match incoming.get(&format) {
            Some(other) => {
                merged.insert(format, merge_entry(entry, other, step));
            }
            None if step.narrows() => debug!(%format, "dropping format"),
            None => {
                merged.insert(format, entry);
            }
        }
    }

    if step.seeds() {
        for (format, entry) in incoming {
            merged.entry(format.clone()).or_insert_with(|| entry.clone());
        }
    }

    prune(merged)
}

fn merge_entry(entry: FormatEntry, other: &FormatEntry, step: MergeStep) -> FormatEntry {
    let mut merged = FormatEntry::new();
    for (name, features) in entry {
        match other.get(&name) {
            Some(incoming) => {
                merged.insert(name, merge_features(features, incoming, step));
            }
            None if step.narrows() => {}
            None => {
                merged.insert(name, features);
            }
        }
    }
    if step.seeds() {
        for (name, features) in other {
            merged.entry(name.clone()).or_insert_with(|| features.clone());
        }
    }
    merged
}

fn merge_features(
    mut features: FormatFeatures,
    incoming: &FormatFeatures,
    step: MergeStep,
) -> FormatFeatures {
    for which in TilingSet::ALL {
        let slot = features.set_mut(which);
        *slot = match (slot.take(), incoming.set(which)) {
            (Some(flags), Some(other)) => Some(merge_flags(flags, other, step.mode)),
            (Some(flags), None) => (!step.narrows()).then_some(flags),
            (None, Some(other)) => step.seeds().then(|| other.clone()),
            (None, None) => None,
        };
    }
    features
}

fn merge_flags(flags: Vec<String>, other: &[String], mode: MergeMode) -> Vec<String> {
    match mode {
        MergeMode::Union => {
            let mut merged = flags;
            for flag in other {
                if !merged.contains(flag) {
                    merged.push(flag.clone());
                }
            }
            merged
        }
        MergeMode::Intersection => flags.into_iter().filter(|f| other.contains(f)).collect(),
    }
}

fn prune(formats: BTreeMap<String, FormatEntry>) -> BTreeMap<String, FormatEntry> {
    formats
        .into_iter()
        .filter_map(|(format, entry)| {
            let entry: FormatEntry = entry
                .into_iter()
                .filter_map(|(name, mut features)| {
                    for which in TilingSet::ALL {
                        let slot = features.set_mut(which);
                        if slot.as_ref().is_some_and(Vec::is_empty) {
                            *slot = None;
                        }
                    }
                    (!features.is_empty()).then_some((name, features))
                })
                .collect();
            (!entry.is_empty()).then_some((format, entry))
        })
        .collect()
}
