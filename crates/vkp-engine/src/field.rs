//! Field merge rules.
//!
//! Union widens every field, intersection narrows it. How a field widens is
//! decided by the limit type the registry assigns to its member:
//!
//! | limit type | union | intersection |
//! |---|---|---|
//! | `exact` | must match | must match |
//! | `max`, `bits` | larger | smaller |
//! | `min` | smaller | larger |
//! | `bitmask` | flag union | flag intersection |
//! | `range` | `[min lo, max hi]` | `[max lo, min hi]` |
//! | `noauto` | removed | removed |
//! | `struct` | member-wise | member-wise |
//!
//! Vectors and small structs such as `VkExtent2D` are combined component-wise.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};
use tracing::debug;
use vkp_registry::{LimitType, MemberDef, Registry};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::document::FieldMap;
use crate::mode::{MergeMode, MergeStep};

/// Result of combining two values of one member.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Merged(Value),
    /// The member must not appear in the output.
    Removed,
    /// The values cannot be combined; the existing value stands.
    Conflict(DiagnosticKind),
}

/// Category a struct belongs to in a capability block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructKind {
    Features,
    Properties,
}

impl StructKind {
    /// Suffix of the core `VkPhysicalDeviceVulkanNN*` struct names.
    pub fn suffix(&self) -> &'static str {
        match self {
            StructKind::Features => "Features",
            StructKind::Properties => "Properties",
        }
    }
}

/// Combine two values of a member with a scalar limit type.
///
/// `struct` members are handled by [`FieldEngine::merge_struct`], which
/// recurses with the nested struct's own classifications.
pub fn merge_field(
    existing: &Value,
    incoming: &Value,
    limit: &LimitType,
    is_bool: bool,
    mode: MergeMode,
) -> FieldOutcome {
    let shape = || FieldOutcome::Conflict(DiagnosticKind::ShapeMismatch(limit.to_string()));

    match limit {
        LimitType::Exact => {
            if existing == incoming {
                FieldOutcome::Merged(existing.clone())
            } else {
                FieldOutcome::Conflict(DiagnosticKind::ExactMismatch {
                    existing: existing.clone(),
                    incoming: incoming.clone(),
                })
            }
        }
        LimitType::Max | LimitType::Bits => {
            pick_bound(existing, incoming, toward(Ordering::Greater, mode))
                .map_or_else(shape, FieldOutcome::Merged)
        }
        LimitType::Min => pick_bound(existing, incoming, toward(Ordering::Less, mode))
            .map_or_else(shape, FieldOutcome::Merged),
        LimitType::Bitmask => match (existing, incoming) {
            (Value::Bool(a), Value::Bool(b)) => FieldOutcome::Merged(Value::Bool(match mode {
                MergeMode::Union => *a || *b,
                MergeMode::Intersection => *a && *b,
            })),
            (Value::Array(a), Value::Array(b)) if !is_bool => {
                FieldOutcome::Merged(Value::Array(merge_flags(a, b, mode)))
            }
            _ => shape(),
        },
        LimitType::Range => {
            merge_range(existing, incoming, mode).map_or_else(shape, FieldOutcome::Merged)
        }
        LimitType::NoAuto => FieldOutcome::Removed,
        LimitType::Struct => shape(),
        LimitType::Unknown(raw) => {
            FieldOutcome::Conflict(DiagnosticKind::UnknownLimitType(raw.clone()))
        }
    }
}

/// Direction to move a bound whose widening direction is `widen`.
fn toward(widen: Ordering, mode: MergeMode) -> Ordering {
    match mode {
        MergeMode::Union => widen,
        MergeMode::Intersection => widen.reverse(),
    }
}

/// Keep the incoming value where it lies in direction `prefer` from the
/// existing one; component-wise for arrays and objects.
fn pick_bound(existing: &Value, incoming: &Value, prefer: Ordering) -> Option<Value> {
    match (existing, incoming) {
        (Value::Number(a), Value::Number(b)) => {
            if compare_numbers(b, a)? == prefer {
                Some(incoming.clone())
            } else {
                Some(existing.clone())
            }
        }
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => a
            .iter()
            .zip(b)
            .map(|(x, y)| pick_bound(x, y, prefer))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (Value::Object(a), Value::Object(b)) if a.len() == b.len() => a
            .iter()
            .map(|(key, x)| Some((key.clone(), pick_bound(x, b.get(key)?, prefer)?)))
            .collect::<Option<Map<_, _>>>()
            .map(Value::Object),
        _ => None,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn merge_flags(existing: &[Value], incoming: &[Value], mode: MergeMode) -> Vec<Value> {
    match mode {
        MergeMode::Union => {
            let mut merged = existing.to_vec();
            for flag in incoming {
                if !merged.contains(flag) {
                    merged.push(flag.clone());
                }
            }
            merged
        }
        MergeMode::Intersection => existing
            .iter()
            .filter(|flag| incoming.contains(flag))
            .cloned()
            .collect(),
    }
}

fn merge_range(existing: &Value, incoming: &Value, mode: MergeMode) -> Option<Value> {
    let (Value::Array(a), Value::Array(b)) = (existing, incoming) else {
        return None;
    };
    if a.len() != 2 || b.len() != 2 {
        return None;
    }
    let low = pick_bound(&a[0], &b[0], toward(Ordering::Less, mode))?;
    let high = pick_bound(&a[1], &b[1], toward(Ordering::Greater, mode))?;
    Some(Value::Array(vec![low, high]))
}

/// Feature switches carry no limit type: union ORs them, intersection drops
/// any switch the inputs disagree on.
fn merge_switch(existing: &Value, incoming: &Value, mode: MergeMode) -> FieldOutcome {
    match (existing, incoming, mode) {
        (Value::Bool(a), Value::Bool(b), MergeMode::Union) => {
            FieldOutcome::Merged(Value::Bool(*a || *b))
        }
        (Value::Bool(a), Value::Bool(b), MergeMode::Intersection) if a != b => {
            FieldOutcome::Removed
        }
        _ if existing == incoming => FieldOutcome::Merged(existing.clone()),
        _ => FieldOutcome::Conflict(DiagnosticKind::ExactMismatch {
            existing: existing.clone(),
            incoming: incoming.clone(),
        }),
    }
}

fn arity_matches(def: &MemberDef, existing: &Value, incoming: &Value) -> bool {
    match def.array_size {
        Some(size) if size > 1 => [existing, incoming]
            .iter()
            .all(|v| v.as_array().map_or(false, |items| items.len() == size as usize)),
        _ => true,
    }
}

/// Whole-struct merging driven by registry classifications.
pub struct FieldEngine<'r> {
    registry: &'r dyn Registry,
    kind: StructKind,
}

impl<'r> FieldEngine<'r> {
    pub fn new(registry: &'r dyn Registry, kind: StructKind) -> Self {
        Self { registry, kind }
    }

    /// Merge `incoming` into `existing`.
    ///
    /// `schema` lists the struct names whose member definitions apply, in
    /// lookup order; `location` prefixes diagnostic paths. Under a narrowing
    /// step members missing from `incoming` are dropped and new members never
    /// appear; otherwise new members are taken verbatim.
    pub fn merge_struct(
        &self,
        schema: &[&str],
        location: &str,
        existing: &FieldMap,
        incoming: &FieldMap,
        step: MergeStep,
        diagnostics: &mut Diagnostics,
    ) -> FieldMap {
        let mut merged = FieldMap::new();

        for (name, current) in existing {
            let Some(next) = incoming.get(name) else {
                if step.narrows() {
                    debug!(
                        member = %format!("{location}.{name}"),
                        "dropping member absent from input"
                    );
                } else {
                    merged.insert(name.clone(), current.clone());
                }
                continue;
            };

            match self.merge_member(schema, location, name, current, next, step, diagnostics) {
                FieldOutcome::Merged(value) => {
                    merged.insert(name.clone(), value);
                }
                FieldOutcome::Removed => {
                    debug!(member = %format!("{location}.{name}"), "removing member");
                }
                FieldOutcome::Conflict(kind) => {
                    diagnostics.report(format!("{location}.{name}"), kind);
                    merged.insert(name.clone(), current.clone());
                }
            }
        }

        if step.seeds() {
            for (name, value) in incoming {
                if !existing.contains_key(name) {
                    merged.insert(name.clone(), value.clone());
                }
            }
        }

        merged
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_member(
        &self,
        schema: &[&str],
        location: &str,
        name: &str,
        existing: &Value,
        incoming: &Value,
        step: MergeStep,
        diagnostics: &mut Diagnostics,
    ) -> FieldOutcome {
        let def = schema
            .iter()
            .find_map(|struct_name| self.registry.member(struct_name, name));

        let Some(def) = def else {
            return match self.kind {
                StructKind::Features => merge_switch(existing, incoming, step.mode),
                StructKind::Properties => FieldOutcome::Conflict(DiagnosticKind::UnknownMember),
            };
        };

        match &def.limittype {
            None if def.is_bool() || self.kind == StructKind::Features => {
                merge_switch(existing, incoming, step.mode)
            }
            None => FieldOutcome::Conflict(DiagnosticKind::UnknownLimitType(String::new())),
            Some(LimitType::Struct) => match (existing, incoming) {
                (Value::Object(a), Value::Object(b)) => {
                    let path = format!("{location}.{name}");
                    let nested = [def.ty.as_str()];
                    FieldOutcome::Merged(Value::Object(
                        self.merge_struct(&nested, &path, a, b, step, diagnostics),
                    ))
                }
                _ => FieldOutcome::Conflict(DiagnosticKind::ShapeMismatch(
                    LimitType::Struct.to_string(),
                )),
            },
            Some(limit) if !arity_matches(def, existing, incoming) => {
                FieldOutcome::Conflict(DiagnosticKind::ShapeMismatch(limit.to_string()))
            }
            Some(limit) => merge_field(existing, incoming, limit, def.is_bool(), step.mode),
        }
    }
}
