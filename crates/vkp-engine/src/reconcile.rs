//! Struct identity reconciliation.
//!
//! The same capability can reach the merge under several names: an extension
//! struct and its KHR/core aliases, or an extension struct whose members were
//! later folded into a `VkPhysicalDeviceVulkanNN*` struct. Before members are
//! merged, every incoming struct is assigned to the accumulated entry it
//! describes, so no two output entries ever refer to the same struct.
//!
//! Resolution for an incoming struct `S`, in priority order:
//!
//! 1. `S` is already accumulated: merge into it.
//! 2. `promoted(S)` is accumulated and differs from `S`: `S` is absorbed.
//! 3. `promoted(S) == S`: `S` is its own entry and absorbs every accumulated
//!    struct that promotes to it.
//! 4. An alias of `S` is accumulated: the higher ranked name keys the entry.
//! 5. Otherwise `S` is new.

use std::collections::{HashMap, HashSet};

use vkp_registry::{vendor_tag, Registry};

use crate::field::StructKind;

/// One output entry and the structs that feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Name the merged entry is stored under.
    pub target: String,
    /// Accumulated structs folded into the entry.
    pub existing: Vec<String>,
    /// Incoming structs folded into the entry.
    pub incoming: Vec<String>,
}

impl Group {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            existing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Every struct name whose member definitions apply to the entry.
    pub fn schema(&self) -> Vec<&str> {
        let mut names = vec![self.target.as_str()];
        for name in self.existing.iter().chain(&self.incoming) {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }
}

/// Assignment of accumulated and incoming structs to output entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub groups: Vec<Group>,
    /// Accumulated structs no incoming struct matched.
    pub untouched: Vec<String>,
}

/// Resolves struct identity for one struct category.
///
/// Promotion targets are memoized for the lifetime of the reconciler, which
/// spans one merge run.
pub struct Reconciler<'r> {
    registry: &'r dyn Registry,
    kind: StructKind,
    promoted: HashMap<String, Option<String>>,
}

impl<'r> Reconciler<'r> {
    pub fn new(registry: &'r dyn Registry, kind: StructKind) -> Self {
        Self {
            registry,
            kind,
            promoted: HashMap::new(),
        }
    }

    /// The `VkPhysicalDeviceVulkanNN*` struct a struct belongs to, derived from
    /// the core version that defines it (or one of its aliases).
    pub fn promoted_name(&mut self, name: &str) -> Option<String> {
        if let Some(cached) = self.promoted.get(name) {
            return cached.clone();
        }
        let resolved = self.resolve_promoted(name);
        self.promoted.insert(name.to_string(), resolved.clone());
        resolved
    }

    fn resolve_promoted(&self, name: &str) -> Option<String> {
        let suffix = self.kind.suffix();
        // VkPhysicalDeviceVulkan11* were introduced in 1.2, so the version
        // lookup would point them at the 1.2 struct.
        if name == format!("VkPhysicalDeviceVulkan11{suffix}") {
            return Some(name.to_string());
        }
        let version = self.registry.defined_by_version(name)?;
        Some(format!(
            "VkPhysicalDeviceVulkan{}{}{}",
            version.major, version.minor, suffix
        ))
    }

    /// Rank used to pick between aliases: core-defined structs first, then
    /// structs defined by a non-`EXT` extension, then `EXT`-only structs.
    fn rank(&self, name: &str) -> u8 {
        let Some(def) = self.registry.struct_def(name) else {
            return 0;
        };
        if def.defined_by_version.is_some() {
            return 3;
        }
        let extensions = &def.defined_by_extensions;
        if extensions.iter().any(|ext| vendor_tag(ext) != Some("EXT")) {
            2
        } else if !extensions.is_empty() {
            1
        } else {
            0
        }
    }

    /// Which of an incoming struct and an already present alias keys the
    /// merged entry. Ties keep the present name.
    pub fn higher<'a>(&self, incoming: &'a str, present: &'a str) -> &'a str {
        if self.rank(incoming) > self.rank(present) {
            incoming
        } else {
            present
        }
    }

    /// Assign accumulated and incoming structs to output entries.
    pub fn plan<'a>(
        &mut self,
        existing: impl IntoIterator<Item = &'a String>,
        incoming: impl IntoIterator<Item = &'a String>,
    ) -> ReconcilePlan {
        let existing: Vec<&String> = existing.into_iter().collect();
        let mut incoming: Vec<&String> = incoming.into_iter().collect();

        // Promotion targets go first so structs promoted to them find them
        // regardless of input order.
        let canonical: HashSet<&String> = incoming
            .iter()
            .copied()
            .filter(|name| self.promoted_name(name).as_deref() == Some(name.as_str()))
            .collect();
        incoming.sort_by_key(|name| !canonical.contains(name));

        let mut state = PlanState {
            existing: existing.iter().map(|name| name.as_str()).collect(),
            existing_order: existing.iter().map(|name| name.to_string()).collect(),
            claimed: HashMap::new(),
            targets: HashMap::new(),
            groups: Vec::new(),
        };

        for name in incoming {
            let idx = self.place(name, &mut state);
            state.groups[idx].incoming.push(name.clone());
        }

        let untouched = state
            .existing_order
            .iter()
            .filter(|name| !state.claimed.contains_key(*name))
            .cloned()
            .collect();

        ReconcilePlan {
            groups: state.groups,
            untouched,
        }
    }

    fn place(&mut self, name: &str, state: &mut PlanState<'_>) -> usize {
        let promoted = self.promoted_name(name);
        let is_canonical = promoted.as_deref() == Some(name);

        if let Some(idx) = state.lookup(name) {
            if is_canonical {
                self.sweep(idx, name, state);
            }
            return idx;
        }

        if let Some(promoted) = promoted {
            if is_canonical {
                let idx = state.new_group(name);
                self.sweep(idx, name, state);
                return idx;
            }
            if let Some(idx) = state.lookup(&promoted) {
                return idx;
            }
        }

        let registry = self.registry;
        for alias in registry.aliases(name) {
            if let Some(idx) = state.lookup(alias) {
                let present = state.groups[idx].target.clone();
                if self.higher(name, &present) == name {
                    state.retarget(idx, name);
                }
                return idx;
            }
        }

        state.new_group(name)
    }

    /// Claim every unclaimed accumulated struct that promotes to `target`.
    fn sweep(&mut self, idx: usize, target: &str, state: &mut PlanState<'_>) {
        let candidates: Vec<String> = state
            .existing_order
            .iter()
            .filter(|name| name.as_str() != target && !state.claimed.contains_key(*name))
            .cloned()
            .collect();
        for name in candidates {
            if self.promoted_name(&name).as_deref() == Some(target) {
                state.claim(&name, idx);
            }
        }
    }
}

struct PlanState<'a> {
    existing: HashSet<&'a str>,
    existing_order: Vec<String>,
    /// Accumulated struct -> group index.
    claimed: HashMap<String, usize>,
    /// Group target -> group index.
    targets: HashMap<String, usize>,
    groups: Vec<Group>,
}

impl PlanState<'_> {
    /// Group a present name belongs to, claiming an accumulated struct into a
    /// group of its own on first sight.
    fn lookup(&mut self, name: &str) -> Option<usize> {
        if let Some(idx) = self.targets.get(name) {
            return Some(*idx);
        }
        if let Some(idx) = self.claimed.get(name) {
            return Some(*idx);
        }
        if self.existing.contains(name) {
            return Some(self.new_group(name));
        }
        None
    }

    fn new_group(&mut self, target: &str) -> usize {
        self.groups.push(Group::new(target));
        let idx = self.groups.len() - 1;
        self.targets.insert(target.to_string(), idx);
        if self.existing.contains(target) && !self.claimed.contains_key(target) {
            self.claim(target, idx);
        }
        idx
    }

    fn claim(&mut self, name: &str, idx: usize) {
        self.claimed.insert(name.to_string(), idx);
        self.groups[idx].existing.push(name.to_string());
    }

    fn retarget(&mut self, idx: usize, target: &str) {
        let previous = std::mem::replace(&mut self.groups[idx].target, target.to_string());
        self.targets.remove(&previous);
        self.targets.insert(target.to_string(), idx);
    }
}
