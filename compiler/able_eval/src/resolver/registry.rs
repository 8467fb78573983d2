//! Type, interface, inherent-method, and impl tables.
//!
//! Populated while modules are evaluated and never shrunk. Impl entries are
//! kept in registration order so that candidate enumeration, and therefore
//! ambiguity reporting, is deterministic.

use std::fmt;
use std::sync::Arc;

use able_ir::ast::{
    GenericParameter, InterfaceDefinition, StructDefinition, TypeExpr, UnionDefinition,
    WhereConstraint,
};
use able_ir::Name;
use able_runtime::errors::{duplicate_impl, undefined_interface};
use able_runtime::value::{FunctionDecl, FunctionValue};
use able_runtime::{Environment, EvalError, Value};
use rustc_hash::{FxHashMap, FxHashSet};

use super::types::visit_names;

/// Failure to register a definition.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Interface '{0}' is not defined")]
    UndefinedInterface(Name),
    #[error("Unnamed impl for ({interface}, {target}) already exists")]
    DuplicateImpl { interface: Name, target: String },
}

impl From<RegistrationError> for EvalError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::UndefinedInterface(name) => undefined_interface(name.as_str()),
            RegistrationError::DuplicateImpl { interface, target } => {
                duplicate_impl(interface.as_str(), &target)
            }
        }
    }
}

/// An interface definition with the scope its default methods close over.
#[derive(Clone)]
pub struct InterfaceEntry {
    pub definition: Arc<InterfaceDefinition>,
    pub env: Environment,
    pub package: Option<Name>,
}

/// `param: Interface` requirement from generic parameters or a where-clause.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConstraintSpec {
    pub param: Name,
    pub interface: TypeExpr,
}

/// Collect constraints from inline generic bounds and a where-clause.
pub fn collect_constraints(
    generic_params: &[GenericParameter],
    where_clause: &[WhereConstraint],
) -> Vec<ConstraintSpec> {
    let inline = generic_params.iter().flat_map(|param| {
        param.constraints.iter().map(|iface| ConstraintSpec {
            param: param.name.clone(),
            interface: iface.clone(),
        })
    });
    let clauses = where_clause.iter().flat_map(|clause| {
        clause.constraints.iter().map(|iface| ConstraintSpec {
            param: clause.type_param.clone(),
            interface: iface.clone(),
        })
    });
    inline.chain(clauses).collect()
}

/// One registered implementation of an interface for a target pattern.
pub struct ImplEntry {
    pub interface: Name,
    pub interface_args: Vec<TypeExpr>,
    /// Target pattern; a single member when registered from a union.
    pub target: TypeExpr,
    /// Members of the union this entry was split from, if any.
    pub union_members: Vec<TypeExpr>,
    pub generic_names: Vec<Name>,
    pub constraints: Vec<ConstraintSpec>,
    /// Explicit methods merged with interface defaults.
    pub methods: FxHashMap<Name, Value>,
    pub package: Option<Name>,
}

impl ImplEntry {
    /// `impl I for T`, with the full union as the target for split entries.
    pub fn describe(&self) -> String {
        if self.union_members.is_empty() {
            format!("impl {} for {}", self.interface, self.target)
        } else {
            let union = TypeExpr::Union(self.union_members.clone());
            format!("impl {} for {union}", self.interface)
        }
    }

    pub fn is_generic_target(&self) -> bool {
        super::types::uses_generics(&self.target, &self.generic_names)
    }
}

impl fmt::Debug for ImplEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// An impl about to be registered.
pub struct ImplSpec {
    pub interface: Name,
    pub interface_args: Vec<TypeExpr>,
    pub target: TypeExpr,
    pub generic_params: Vec<GenericParameter>,
    pub where_clause: Vec<WhereConstraint>,
    pub methods: FxHashMap<Name, Value>,
    pub package: Option<Name>,
}

#[derive(Default)]
pub struct TypeRegistry {
    structs: FxHashMap<Name, Arc<StructDefinition>>,
    unions: FxHashMap<Name, Arc<UnionDefinition>>,
    interfaces: FxHashMap<Name, InterfaceEntry>,
    inherent: FxHashMap<Name, FxHashMap<Name, Value>>,
    impls: Vec<Arc<ImplEntry>>,
    /// `(interface, target, constraints)` keys of unnamed impls.
    unnamed_keys: FxHashSet<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Types

    pub fn register_struct(&mut self, def: Arc<StructDefinition>) {
        tracing::debug!(name = %def.name, "struct registered");
        self.structs.insert(def.name.clone(), def);
    }

    pub fn register_union(&mut self, def: Arc<UnionDefinition>) {
        tracing::debug!(name = %def.name, "union registered");
        self.unions.insert(def.name.clone(), def);
    }

    pub fn register_interface(&mut self, entry: InterfaceEntry) {
        tracing::debug!(name = %entry.definition.name, "interface registered");
        self.interfaces
            .insert(entry.definition.name.clone(), entry);
    }

    pub fn struct_def(&self, name: &str) -> Option<&Arc<StructDefinition>> {
        self.structs.get(name)
    }

    pub fn union(&self, name: &str) -> Option<&Arc<UnionDefinition>> {
        self.unions.get(name)
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceEntry> {
        self.interfaces.get(name)
    }

    /// Whether `name` is a registered struct, union, or interface.
    pub fn is_known_type(&self, name: &str) -> bool {
        self.structs.contains_key(name)
            || self.unions.contains_key(name)
            || self.interfaces.contains_key(name)
    }

    // Inherent methods

    pub fn add_inherent(&mut self, type_name: impl Into<Name>, method: impl Into<Name>, value: Value) {
        self.inherent
            .entry(type_name.into())
            .or_default()
            .insert(method.into(), value);
    }

    pub fn inherent_method(&self, type_name: &str, method: &str) -> Option<&Value> {
        self.inherent
            .get(super::types::canonical_name(type_name))
            .and_then(|methods| methods.get(method))
    }

    // Impls

    pub fn impls(&self) -> &[Arc<ImplEntry>] {
        &self.impls
    }

    /// Explicit impl methods plus default bodies from the interface and its
    /// bases. Explicit methods win; nearer interfaces win over bases.
    pub fn merge_default_methods(
        &self,
        interface: &str,
        mut methods: FxHashMap<Name, Value>,
    ) -> Result<FxHashMap<Name, Value>, RegistrationError> {
        if !self.interfaces.contains_key(interface) {
            return Err(RegistrationError::UndefinedInterface(Name::new(interface)));
        }
        for iface in self.interface_closure(interface) {
            let Some(entry) = self.interfaces.get(iface.as_str()) else {
                continue;
            };
            for sig in &entry.definition.signatures {
                let Some(default) = &sig.default_impl else {
                    continue;
                };
                if methods.contains_key(&sig.name) {
                    continue;
                }
                let mut function = FunctionValue::new(
                    FunctionDecl::Function(Arc::clone(default)),
                    entry.env.clone(),
                )
                .with_package(entry.package.clone());
                function.priority = -1;
                methods.insert(sig.name.clone(), Value::function(function));
            }
        }
        Ok(methods)
    }

    /// Register an unnamed impl, splitting union targets into one entry per
    /// member.
    pub fn register_impl(&mut self, spec: ImplSpec) -> Result<(), RegistrationError> {
        let methods = self.merge_default_methods(spec.interface.as_str(), spec.methods)?;
        let constraints = collect_constraints(&spec.generic_params, &spec.where_clause);
        let generic_names = self.generic_names(&spec.generic_params, &spec.target, &constraints);

        let key = constraint_key(&spec.interface, &spec.interface_args, &spec.target, &constraints);
        if !self.unnamed_keys.insert(key) {
            return Err(RegistrationError::DuplicateImpl {
                interface: spec.interface,
                target: spec.target.to_string(),
            });
        }

        let members = self.union_members(&spec.target);
        let variants = if members.is_empty() {
            vec![spec.target.clone()]
        } else {
            members.clone()
        };
        for variant in variants {
            tracing::debug!(
                interface = %spec.interface,
                target = %variant,
                "impl registered"
            );
            self.impls.push(Arc::new(ImplEntry {
                interface: spec.interface.clone(),
                interface_args: spec.interface_args.clone(),
                target: variant,
                union_members: members.clone(),
                generic_names: generic_names.clone(),
                constraints: constraints.clone(),
                methods: methods.clone(),
                package: spec.package.clone(),
            }));
        }
        Ok(())
    }

    /// Members of a union target: written `A | B`, `?T`, or a union name.
    fn union_members(&self, target: &TypeExpr) -> Vec<TypeExpr> {
        match target {
            TypeExpr::Union(members) => members.clone(),
            TypeExpr::Nullable(inner) => vec![TypeExpr::simple("nil"), (**inner).clone()],
            TypeExpr::Simple(name) => self
                .unions
                .get(name)
                .filter(|def| def.generic_params.is_empty())
                .map(|def| def.variants.clone())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Explicit generic parameters plus type-variable-like names in the
    /// target or constraints that do not name a registered type.
    fn generic_names(
        &self,
        params: &[GenericParameter],
        target: &TypeExpr,
        constraints: &[ConstraintSpec],
    ) -> Vec<Name> {
        let mut names: Vec<Name> = params.iter().map(|p| p.name.clone()).collect();
        let mut add = |name: &Name| {
            if name.is_type_variable_like()
                && !self.is_known_type(name.as_str())
                && !names.contains(name)
            {
                names.push(name.clone());
            }
        };
        visit_names(target, &mut add);
        for constraint in constraints {
            add(&constraint.param);
        }
        names
    }

    // Interfaces

    /// The interface and all its base interfaces, nearest first, each once.
    pub fn interface_closure(&self, interface: &str) -> Vec<Name> {
        let mut out: Vec<Name> = Vec::new();
        let mut queue = vec![Name::new(interface)];
        while let Some(name) = queue.pop() {
            if out.contains(&name) {
                continue;
            }
            if let Some(entry) = self.interfaces.get(name.as_str()) {
                for base in entry.definition.base_interfaces.iter().rev() {
                    if let Some(base_name) = base.base_name() {
                        queue.push(base_name.clone());
                    }
                }
            }
            out.push(name);
        }
        out
    }

    /// Whether `interface` is `ancestor` or derives from it.
    pub fn interface_extends(&self, interface: &str, ancestor: &str) -> bool {
        self.interface_closure(interface)
            .iter()
            .any(|name| name == ancestor)
    }

    /// Length of the longest base-interface chain below `interface`.
    pub fn interface_depth(&self, interface: &str) -> usize {
        let mut visiting = Vec::new();
        self.depth_of(interface, &mut visiting)
    }

    fn depth_of(&self, interface: &str, visiting: &mut Vec<Name>) -> usize {
        if visiting.iter().any(|name| name == interface) {
            return 0;
        }
        let Some(entry) = self.interfaces.get(interface) else {
            return 0;
        };
        visiting.push(Name::new(interface));
        let depth = entry
            .definition
            .base_interfaces
            .iter()
            .filter_map(TypeExpr::base_name)
            .map(|base| 1 + self.depth_of(base.as_str(), visiting))
            .max()
            .unwrap_or(0);
        visiting.pop();
        depth
    }
}

fn constraint_key(
    interface: &Name,
    interface_args: &[TypeExpr],
    target: &TypeExpr,
    constraints: &[ConstraintSpec],
) -> String {
    let mut parts: Vec<String> = constraints
        .iter()
        .map(|c| format!("{}:{}", c.param, c.interface))
        .collect();
    parts.sort();
    let args: Vec<String> = interface_args.iter().map(ToString::to_string).collect();
    format!("{interface}<{}>::{target}::{}", args.join(","), parts.join("&"))
}
