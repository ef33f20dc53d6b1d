//! Feature and property struct merging.

use tracing::debug;
use vkp_registry::Registry;

use crate::diagnostics::Diagnostics;
use crate::document::{FieldMap, StructMap};
use crate::field::{FieldEngine, StructKind};
use crate::mode::MergeStep;
use crate::reconcile::Reconciler;

/// Merges one struct category (`features` or `properties`).
pub struct StructMerger<'r> {
    engine: FieldEngine<'r>,
    reconciler: Reconciler<'r>,
}

impl<'r> StructMerger<'r> {
    pub fn new(registry: &'r dyn Registry, kind: StructKind) -> Self {
        Self {
            engine: FieldEngine::new(registry, kind),
            reconciler: Reconciler::new(registry, kind),
        }
    }

    /// Fold `incoming` into the accumulated structs, returning the new
    /// accumulator.
    ///
    /// Each output entry collects the accumulated structs and the incoming
    /// structs the reconciler assigned to it. Structs on the same side are
    /// combined first (they describe one device), then the two sides are
    /// merged under `step`. Entries emptied by a narrowing step are dropped;
    /// structs declared empty are otherwise kept.
    pub fn merge(
        &mut self,
        mut accumulated: StructMap,
        incoming: &StructMap,
        step: MergeStep,
        diagnostics: &mut Diagnostics,
    ) -> StructMap {
        let plan = self.reconciler.plan(accumulated.keys(), incoming.keys());
        let mut merged = StructMap::new();

        for name in plan.untouched {
            let Some(fields) = accumulated.remove(&name) else {
                continue;
            };
            if step.narrows() {
                debug!(%name, "dropping struct absent from input");
            } else {
                merged.insert(name, fields);
            }
        }

        for group in &plan.groups {
            let schema = group.schema();
            let existing: Vec<FieldMap> = group
                .existing
                .iter()
                .filter_map(|name| accumulated.remove(name))
                .collect();
            let arriving: Vec<FieldMap> = group
                .incoming
                .iter()
                .filter_map(|name| incoming.get(name).cloned())
                .collect();

            let existing = self.combine(&schema, &group.target, existing, diagnostics);
            let arriving = self.combine(&schema, &group.target, arriving, diagnostics);

            match (existing, arriving) {
                (Some(existing), Some(arriving)) => {
                    let fields = self.engine.merge_struct(
                        &schema,
                        &group.target,
                        &existing,
                        &arriving,
                        step,
                        diagnostics,
                    );
                    merged.insert(group.target.clone(), fields);
                }
                (None, Some(arriving)) if step.seeds() => {
                    merged.insert(group.target.clone(), arriving);
                }
                (None, Some(_)) => {
                    debug!(name = %group.target, "skipping struct absent from earlier inputs");
                }
                (Some(existing), None) if !step.narrows() => {
                    merged.insert(group.target.clone(), existing);
                }
                _ => {}
            }
        }

        if step.narrows() {
            merged.retain(|name, fields| {
                if fields.is_empty() {
                    debug!(%name, "dropping struct emptied by intersection");
                }
                !fields.is_empty()
            });
        }
        merged
    }

    /// Union of several views of the same struct from one side of the merge.
    fn combine(
        &self,
        schema: &[&str],
        location: &str,
        parts: Vec<FieldMap>,
        diagnostics: &mut Diagnostics,
    ) -> Option<FieldMap> {
        let mut parts = parts.into_iter();
        let first = parts.next()?;
        Some(parts.fold(first, |combined, next| {
            self.engine
                .merge_struct(schema, location, &combined, &next, MergeStep::combine(), diagnostics)
        }))
    }
}
