//! Per-category merging of capability blocks.

mod extensions;
mod formats;
mod queues;
mod structs;

pub use extensions::merge_extensions;
pub use formats::merge_formats;
pub use queues::merge_queue_families;
pub use structs::StructMerger;

use vkp_registry::Registry;

use crate::diagnostics::Diagnostics;
use crate::document::CapabilityBlock;
use crate::field::StructKind;
use crate::mode::MergeStep;

/// Merges whole capability blocks, category by category.
pub struct BlockMerger<'r> {
    features: StructMerger<'r>,
    properties: StructMerger<'r>,
}

impl<'r> BlockMerger<'r> {
    pub fn new(registry: &'r dyn Registry) -> Self {
        Self {
            features: StructMerger::new(registry, StructKind::Features),
            properties: StructMerger::new(registry, StructKind::Properties),
        }
    }

    /// Fold `incoming` into `accumulated`. A category missing from
    /// `incoming` behaves as an empty one.
    pub fn merge(
        &mut self,
        accumulated: CapabilityBlock,
        incoming: &CapabilityBlock,
        step: MergeStep,
        diagnostics: &mut Diagnostics,
    ) -> CapabilityBlock {
        CapabilityBlock {
            extensions: merge_extensions(accumulated.extensions, &incoming.extensions, step),
            features: self.features.merge(
                accumulated.features,
                &incoming.features,
                step,
                diagnostics,
            ),
            properties: self.properties.merge(
                accumulated.properties,
                &incoming.properties,
                step,
                diagnostics,
            ),
            formats: merge_formats(accumulated.formats, &incoming.formats, step),
            queue_families: merge_queue_families(
                accumulated.queue_families,
                &incoming.queue_families,
                step,
            ),
        }
    }
}
