//! Method and interface resolution.
//!
//! # Lookup order
//!
//! For `receiver.method(...)` the interpreter first checks struct fields,
//! then asks this module:
//!
//! 1. Inherent methods on the receiver's type name always win.
//! 2. Otherwise every unnamed impl entry whose target pattern matches the
//!    receiver's runtime type and that provides the method (explicitly or
//!    through an interface default) is a candidate, provided its generic
//!    constraints hold for the bound type arguments.
//! 3. Candidates are ranked by [`TypeRegistry::compare_candidates`]; a
//!    unique maximum wins, anything else is an ambiguity error.
//!
//! Named impls are not candidates; they are reached through their
//! namespace value.

mod registry;
mod specificity;
pub mod types;

pub use registry::{
    collect_constraints, ConstraintSpec, ImplEntry, ImplSpec, InterfaceEntry,
    RegistrationError, TypeRegistry,
};
pub use specificity::Candidate;
pub use types::{match_template, runtime_type, Bindings};

use able_ir::ast::TypeExpr;
use able_runtime::errors::{ambiguous_method, constraint_violation, undefined_interface};
use able_runtime::EvalError;

/// Guard against constraint checks that recurse through blanket impls.
const MAX_CONSTRAINT_DEPTH: usize = 32;

impl TypeRegistry {
    /// Resolve `method` among impl entries for a receiver of type `ty`.
    ///
    /// `interface` restricts candidates to impls of that interface or of
    /// interfaces derived from it. `Ok(None)` means no impl provides the
    /// method; when candidates were rejected only by their constraints, the
    /// first constraint violation is returned instead.
    pub fn resolve_impl_method(
        &self,
        ty: &TypeExpr,
        method: &str,
        interface: Option<&str>,
    ) -> Result<Option<Candidate>, EvalError> {
        self.resolve_at(ty, method, interface, 0)
    }

    fn resolve_at(
        &self,
        ty: &TypeExpr,
        method: &str,
        interface: Option<&str>,
        depth: usize,
    ) -> Result<Option<Candidate>, EvalError> {
        if depth > MAX_CONSTRAINT_DEPTH {
            return Ok(None);
        }
        let mut candidates = Vec::new();
        let mut constraint_error = None;
        for entry in self.impls() {
            if let Some(filter) = interface {
                if !self.interface_extends(entry.interface.as_str(), filter) {
                    continue;
                }
            }
            let Some(method_value) = entry.methods.get(method) else {
                continue;
            };
            let mut bindings = Bindings::default();
            if !match_template(&entry.target, ty, &entry.generic_names, &mut bindings) {
                continue;
            }
            if let Err(err) = self.check_entry_constraints(entry, &bindings, depth + 1) {
                constraint_error.get_or_insert(err);
                continue;
            }
            candidates.push(Candidate {
                entry: std::sync::Arc::clone(entry),
                method: method_value.clone(),
                bindings,
            });
        }

        if candidates.is_empty() {
            return constraint_error.map_or(Ok(None), Err);
        }
        match self.select_best(candidates) {
            Ok(best) => {
                tracing::trace!(method, ty = %ty, chosen = %best.entry.describe(), "impl resolved");
                Ok(Some(best))
            }
            Err(tied) => {
                let mut descriptions: Vec<String> = Vec::with_capacity(tied.len());
                for candidate in &tied {
                    let description = candidate.entry.describe();
                    if !descriptions.contains(&description) {
                        descriptions.push(description);
                    }
                }
                Err(ambiguous_method(method, &ty.to_string(), &descriptions))
            }
        }
    }

    fn check_entry_constraints(
        &self,
        entry: &ImplEntry,
        bindings: &Bindings,
        depth: usize,
    ) -> Result<(), EvalError> {
        for constraint in &entry.constraints {
            let Some(bound) = bindings.get(&constraint.param) else {
                continue;
            };
            self.ensure_satisfies_at(bound, &constraint.interface, depth)?;
        }
        Ok(())
    }

    /// Check that `ty` provides every method `interface` (and its bases)
    /// declares, inherently or through an impl.
    ///
    /// Unknown (`_`) types pass: there is nothing to check them against.
    pub fn ensure_satisfies(&self, ty: &TypeExpr, interface: &TypeExpr) -> Result<(), EvalError> {
        self.ensure_satisfies_at(ty, interface, 0)
    }

    fn ensure_satisfies_at(
        &self,
        ty: &TypeExpr,
        interface: &TypeExpr,
        depth: usize,
    ) -> Result<(), EvalError> {
        if matches!(ty, TypeExpr::Wildcard) || depth > MAX_CONSTRAINT_DEPTH {
            return Ok(());
        }
        let Some(iface_name) = interface.base_name() else {
            return Ok(());
        };
        if self.interface(iface_name.as_str()).is_none() {
            return Err(undefined_interface(iface_name.as_str()));
        }
        let type_name = ty.to_string();
        for name in self.interface_closure(iface_name.as_str()) {
            let Some(entry) = self.interface(name.as_str()) else {
                continue;
            };
            for sig in &entry.definition.signatures {
                if !self.type_has_method(ty, sig.name.as_str(), name.as_str(), depth) {
                    return Err(constraint_violation(&type_name, name.as_str(), sig.name.as_str()));
                }
            }
        }
        Ok(())
    }

    fn type_has_method(&self, ty: &TypeExpr, method: &str, interface: &str, depth: usize) -> bool {
        if let Some(name) = ty.base_name() {
            if self.inherent_method(name.as_str(), method).is_some() {
                return true;
            }
        }
        matches!(self.resolve_at(ty, method, Some(interface), depth + 1), Ok(Some(_)))
    }

    /// Whether values of type `ty` may be viewed through `interface`.
    ///
    /// True when an impl of the interface (or of a derived interface)
    /// applies, or when the interface declares methods and the type
    /// provides all of them.
    pub fn implements(&self, ty: &TypeExpr, interface: &str) -> bool {
        let Some(entry) = self.interface(interface) else {
            return false;
        };
        let has_impl = self.impls().iter().any(|candidate| {
            let mut bindings = Bindings::default();
            self.interface_extends(candidate.interface.as_str(), interface)
                && match_template(&candidate.target, ty, &candidate.generic_names, &mut bindings)
                && self.check_entry_constraints(candidate, &bindings, 1).is_ok()
        });
        if has_impl {
            return true;
        }
        let declares_methods = self
            .interface_closure(entry.definition.name.as_str())
            .iter()
            .filter_map(|name| self.interface(name.as_str()))
            .any(|iface| !iface.definition.signatures.is_empty());
        declares_methods
            && self
                .ensure_satisfies(ty, &TypeExpr::simple(interface))
                .is_ok()
    }
}
