use tracing::debug;

use crate::document::QueueFamilyEntry;
use crate::mode::MergeStep;

/// Merge queue family descriptor lists.
///
/// Descriptors are compared by their `VkQueueFamilyProperties` alone (queue
/// flags as an unordered set). Union appends descriptors not already present;
/// intersection keeps accumulated descriptors that also appear in the
/// incoming list. The first descriptor seen keeps its chained structs.
pub fn merge_queue_families(
    accumulated: Vec<QueueFamilyEntry>,
    incoming: &[QueueFamilyEntry],
    step: MergeStep,
) -> Vec<QueueFamilyEntry> {
    if step.narrows() {
        let before = accumulated.len();
        let kept: Vec<_> = accumulated
            .into_iter()
            .filter(|entry| incoming.iter().any(|other| entry.same_family(other)))
            .collect();
        if kept.len() != before {
            debug!(dropped = before - kept.len(), "dropping queue families");
        }
        return kept;
    }

    let mut merged = accumulated;
    for entry in incoming {
        if !merged.iter().any(|present| present.same_family(entry)) {
            merged.push(entry.clone());
        }
    }
    merged
}
