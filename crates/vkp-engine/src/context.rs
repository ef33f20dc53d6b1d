use crate::blocks::BlockMerger;
use crate::diagnostics::Diagnostics;
use crate::document::CapabilityBlock;
use crate::mode::{MergeMode, MergeStep};

/// State of one merge run: the mode, how many inputs were folded so far,
/// the accumulated block and the diagnostics gathered on the way.
#[derive(Debug)]
pub struct MergeContext {
    mode: MergeMode,
    folded: usize,
    accumulator: CapabilityBlock,
    diagnostics: Diagnostics,
}

impl MergeContext {
    pub fn new(mode: MergeMode) -> Self {
        Self {
            mode,
            folded: 0,
            accumulator: CapabilityBlock::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    /// Step for the next input to fold.
    pub fn step(&self) -> MergeStep {
        MergeStep::new(self.mode, self.folded == 0)
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Fold one input's capability view into the accumulator.
    pub fn fold(&mut self, merger: &mut BlockMerger<'_>, view: &CapabilityBlock) {
        let step = self.step();
        let accumulated = std::mem::take(&mut self.accumulator);
        self.accumulator = merger.merge(accumulated, view, step, &mut self.diagnostics);
        self.folded += 1;
    }

    pub fn finish(self) -> (CapabilityBlock, Diagnostics) {
        (self.accumulator, self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkp_registry::RegistrySnapshot;

    #[test]
    fn test_first_fold_seeds_then_narrows() {
        let registry = RegistrySnapshot::default();
        let mut merger = BlockMerger::new(&registry);
        let mut context = MergeContext::new(MergeMode::Intersection);
        assert!(context.step().first);

        let mut view = CapabilityBlock::default();
        view.extensions.insert("VK_KHR_swapchain".into(), 70);
        context.fold(&mut merger, &view);
        assert!(!context.step().first);
        assert!(context.step().narrows());

        context.fold(&mut merger, &CapabilityBlock::default());
        let (block, diagnostics) = context.finish();
        assert!(block.is_empty());
        assert!(diagnostics.is_empty());
    }
}
