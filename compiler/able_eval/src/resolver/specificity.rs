//! Specificity ordering between applicable impl candidates.
//!
//! Rules are tried in order; the first that distinguishes two candidates
//! decides:
//!
//! 1. a concrete target beats a generic one
//! 2. constraint-set inclusion, compared per generic parameter position
//! 3. a non-union entry beats one split from a union
//! 4. a strictly smaller union beats a larger one containing it
//! 5. a more derived interface beats its bases
//! 6. more concrete nodes in the target template
//!
//! Candidates no rule distinguishes are unordered.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use able_ir::ast::TypeExpr;
use able_ir::Name;
use able_runtime::Value;
use rustc_hash::FxHashMap;

use super::registry::ImplEntry;
use super::types::{template_score, visit_names, Bindings};
use super::TypeRegistry;

/// An impl entry that matched a receiver type and provides the method.
#[derive(Clone)]
pub struct Candidate {
    pub entry: Arc<ImplEntry>,
    pub method: Value,
    pub bindings: Bindings,
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("impl", &self.entry.describe())
            .field("method", &self.method.type_name())
            .finish_non_exhaustive()
    }
}

/// Interface requirements per generic-parameter position in the target.
type ConstraintSets = FxHashMap<usize, BTreeSet<String>>;

impl TypeRegistry {
    /// How `a` compares to `b`; `Greater` means `a` is more specific.
    pub fn compare_candidates(&self, a: &ImplEntry, b: &ImplEntry) -> Ordering {
        let concrete = a.is_generic_target().cmp(&b.is_generic_target()).reverse();
        if concrete != Ordering::Equal {
            return concrete;
        }

        let constraints = compare_constraint_sets(
            &self.constraint_sets(a),
            &self.constraint_sets(b),
        );
        if constraints != Ordering::Equal {
            return constraints;
        }

        match (a.union_members.is_empty(), b.union_members.is_empty()) {
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {
                let a_set = union_keys(&a.union_members);
                let b_set = union_keys(&b.union_members);
                if a_set.len() < b_set.len() && a_set.is_subset(&b_set) {
                    return Ordering::Greater;
                }
                if b_set.len() < a_set.len() && b_set.is_subset(&a_set) {
                    return Ordering::Less;
                }
            }
            (true, true) => {}
        }

        if a.interface != b.interface {
            let depth = self
                .interface_depth(a.interface.as_str())
                .cmp(&self.interface_depth(b.interface.as_str()));
            if depth != Ordering::Equal {
                return depth;
            }
        }

        template_score(&a.target, &a.generic_names)
            .cmp(&template_score(&b.target, &b.generic_names))
    }

    /// The single maximally specific candidate, or every tied contender.
    pub fn select_best(&self, candidates: Vec<Candidate>) -> Result<Candidate, Vec<Candidate>> {
        let maximal: Vec<usize> = (0..candidates.len())
            .filter(|&i| {
                !candidates.iter().enumerate().any(|(j, other)| {
                    j != i
                        && self.compare_candidates(&other.entry, &candidates[i].entry)
                            == Ordering::Greater
                })
            })
            .collect();
        if let [only] = maximal.as_slice() {
            let index = *only;
            let mut candidates = candidates;
            return Ok(candidates.swap_remove(index));
        }
        Err(candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| maximal.contains(i))
            .map(|(_, candidate)| candidate)
            .collect())
    }

    fn constraint_sets(&self, entry: &ImplEntry) -> ConstraintSets {
        let positions = generic_positions(&entry.target, &entry.generic_names);
        let mut sets = ConstraintSets::default();
        for constraint in &entry.constraints {
            let Some(position) = positions.iter().position(|name| *name == constraint.param) else {
                continue;
            };
            let Some(iface) = constraint.interface.base_name() else {
                continue;
            };
            let set = sets.entry(position).or_default();
            for name in self.interface_closure(iface.as_str()) {
                set.insert(name.to_string());
            }
        }
        sets
    }
}

/// Generic names in order of first appearance in the target.
fn generic_positions(target: &TypeExpr, generics: &[Name]) -> Vec<Name> {
    let mut out: Vec<Name> = Vec::new();
    visit_names(target, &mut |name| {
        if generics.contains(name) && !out.contains(name) {
            out.push(name.clone());
        }
    });
    out
}

/// `Greater` when `a` requires at least as much as `b` at every position
/// and strictly more at one; `Equal` when neither dominates.
fn compare_constraint_sets(a: &ConstraintSets, b: &ConstraintSets) -> Ordering {
    let empty = BTreeSet::new();
    let mut a_stronger = false;
    let mut b_stronger = false;
    let positions: BTreeSet<usize> = a.keys().chain(b.keys()).copied().collect();
    for position in positions {
        let a_set = a.get(&position).unwrap_or(&empty);
        let b_set = b.get(&position).unwrap_or(&empty);
        if a_set == b_set {
            continue;
        }
        if a_set.is_superset(b_set) {
            a_stronger = true;
        } else if b_set.is_superset(a_set) {
            b_stronger = true;
        } else {
            return Ordering::Equal;
        }
    }
    match (a_stronger, b_stronger) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn union_keys(members: &[TypeExpr]) -> BTreeSet<String> {
    members.iter().map(ToString::to_string).collect()
}
