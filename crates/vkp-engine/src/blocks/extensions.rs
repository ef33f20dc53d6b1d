use std::collections::BTreeMap;

use tracing::debug;

use crate::mode::{MergeMode, MergeStep};

/// Merge extension name -> spec version maps.
///
/// Union keeps every extension at its highest version. Intersection keeps
/// only extensions every input lists, at the lowest version seen.
pub fn merge_extensions(
    accumulated: BTreeMap<String, u32>,
    incoming: &BTreeMap<String, u32>,
    step: MergeStep,
) -> BTreeMap<String, u32> {
    let mut merged = BTreeMap::new();

    for (name, version) in accumulated {
        match incoming.get(&name) {
            Some(other) => {
                let version = match step.mode {
                    MergeMode::Union => version.max(*other),
                    MergeMode::Intersection => version.min(*other),
                };
                merged.insert(name, version);
            }
            None if step.narrows() => debug!(extension = %name, "dropping extension"),
            None => {
                merged.insert(name, version);
            }
        }
    }

    if step.seeds() {
        for (name, version) in incoming {
            merged.entry(name.clone()).or_insert(*version);
        }
    }

    merged
}
