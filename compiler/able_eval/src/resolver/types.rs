//! Runtime types and type-template matching.
//!
//! A value's runtime type is expressed as a [`TypeExpr`] so that impl
//! targets (`Wrapper<T>`, `A | B`, `T`) can be matched against it with the
//! same machinery that binds generic parameters.

use std::sync::Arc;

use able_ir::ast::{FloatType, IntegerType, TypeExpr};
use able_ir::Name;
use able_runtime::value::{FloatValue, InterfaceValue, StructFields, StructInstance};
use able_runtime::{EvalResult, Value};
use rustc_hash::FxHashMap;

use super::TypeRegistry;

/// Generic parameter name to the type it was bound to.
pub type Bindings = FxHashMap<Name, TypeExpr>;

/// Nesting limit when deriving type arguments from field values.
const MAX_TYPE_DEPTH: usize = 8;

/// Canonical spelling of a type name.
pub fn canonical_name(name: &str) -> &str {
    match name {
        "string" => "String",
        "Proc" => "ProcHandle",
        other => other,
    }
}

fn names_match(a: &str, b: &str) -> bool {
    canonical_name(a) == canonical_name(b)
}

/// Runtime type of a value. Interface wrappers are looked through.
pub fn runtime_type(value: &Value) -> TypeExpr {
    runtime_type_at(value, 0)
}

fn runtime_type_at(value: &Value, depth: usize) -> TypeExpr {
    match value.underlying() {
        Value::Struct(inst) => struct_type(inst, depth),
        other => TypeExpr::simple(other.type_name()),
    }
}

fn struct_type(inst: &Arc<StructInstance>, depth: usize) -> TypeExpr {
    let def = &inst.definition;
    if !inst.type_args.is_empty() {
        return TypeExpr::generic(def.name.clone(), inst.type_args.clone());
    }
    if def.generic_params.is_empty() {
        return TypeExpr::Simple(def.name.clone());
    }
    if depth >= MAX_TYPE_DEPTH {
        let args = vec![TypeExpr::Wildcard; def.generic_params.len()];
        return TypeExpr::generic(def.name.clone(), args);
    }

    // Infer the arguments from the field values.
    let generics: Vec<Name> = def.generic_params.iter().map(|p| p.name.clone()).collect();
    let mut bindings = Bindings::default();
    let values: Vec<Value> = match inst.fields() {
        StructFields::Named(fields) => def
            .fields
            .iter()
            .map(|field| {
                field
                    .name
                    .as_ref()
                    .and_then(|name| {
                        fields
                            .iter()
                            .find(|(f, _)| f == name)
                            .map(|(_, v)| v.clone())
                    })
                    .unwrap_or(Value::Nil)
            })
            .collect(),
        StructFields::Positional(slots) => slots,
    };
    for (field, value) in def.fields.iter().zip(&values) {
        let actual = runtime_type_at(value, depth + 1);
        match_template(&field.ty, &actual, &generics, &mut bindings);
    }
    let args = generics
        .iter()
        .map(|name| bindings.get(name).cloned().unwrap_or(TypeExpr::Wildcard))
        .collect();
    TypeExpr::generic(def.name.clone(), args)
}

/// Structural equality where `_` matches anything.
pub fn types_equivalent(a: &TypeExpr, b: &TypeExpr) -> bool {
    match (a, b) {
        (TypeExpr::Wildcard, _) | (_, TypeExpr::Wildcard) => true,
        (TypeExpr::Simple(x), TypeExpr::Simple(y)) => names_match(x.as_str(), y.as_str()),
        (TypeExpr::Generic { base: xb, args: xa }, TypeExpr::Generic { base: yb, args: ya }) => {
            types_equivalent(xb, yb)
                && xa.len() == ya.len()
                && xa.iter().zip(ya).all(|(x, y)| types_equivalent(x, y))
        }
        (TypeExpr::Nullable(x), TypeExpr::Nullable(y))
        | (TypeExpr::Result(x), TypeExpr::Result(y)) => types_equivalent(x, y),
        (TypeExpr::Union(xs), TypeExpr::Union(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| types_equivalent(x, y))
        }
        (
            TypeExpr::Function { params: xp, ret: xr },
            TypeExpr::Function { params: yp, ret: yr },
        ) => {
            xp.len() == yp.len()
                && xp.iter().zip(yp).all(|(x, y)| types_equivalent(x, y))
                && types_equivalent(xr, yr)
        }
        _ => false,
    }
}

/// Match `actual` against `template`, binding the names in `generics`.
///
/// A repeated generic name must bind to equivalent types. A template
/// `Wrapper<T>` matches a bare `Wrapper` by binding `T` to `_`, and a bare
/// template name matches any instantiation of it.
pub fn match_template(
    template: &TypeExpr,
    actual: &TypeExpr,
    generics: &[Name],
    bindings: &mut Bindings,
) -> bool {
    match template {
        TypeExpr::Wildcard => true,
        TypeExpr::Simple(name) if generics.contains(name) => match bindings.get(name) {
            Some(bound) => types_equivalent(bound, actual),
            None => {
                bindings.insert(name.clone(), actual.clone());
                true
            }
        },
        _ if matches!(actual, TypeExpr::Wildcard) => {
            bind_wildcards(template, generics, bindings);
            true
        }
        TypeExpr::Simple(name) => actual
            .base_name()
            .is_some_and(|actual_name| names_match(name.as_str(), actual_name.as_str())),
        TypeExpr::Generic { base, args } => match actual {
            TypeExpr::Generic {
                base: actual_base,
                args: actual_args,
            } => {
                args.len() == actual_args.len()
                    && match_template(base, actual_base, generics, bindings)
                    && args
                        .iter()
                        .zip(actual_args)
                        .all(|(t, a)| match_template(t, a, generics, bindings))
            }
            TypeExpr::Simple(_) => {
                if !match_template(base, actual, generics, bindings) {
                    return false;
                }
                for arg in args {
                    bind_wildcards(arg, generics, bindings);
                }
                true
            }
            _ => false,
        },
        TypeExpr::Nullable(inner) => match actual {
            TypeExpr::Nullable(actual_inner) => {
                match_template(inner, actual_inner, generics, bindings)
            }
            _ => false,
        },
        TypeExpr::Result(inner) => match actual {
            TypeExpr::Result(actual_inner) => match_template(inner, actual_inner, generics, bindings),
            _ => false,
        },
        TypeExpr::Union(members) => match actual {
            TypeExpr::Union(actual_members) => {
                members.len() == actual_members.len()
                    && members
                        .iter()
                        .zip(actual_members)
                        .all(|(t, a)| match_template(t, a, generics, bindings))
            }
            _ => false,
        },
        TypeExpr::Function { params, ret } => match actual {
            TypeExpr::Function {
                params: actual_params,
                ret: actual_ret,
            } => {
                params.len() == actual_params.len()
                    && params
                        .iter()
                        .zip(actual_params)
                        .all(|(t, a)| match_template(t, a, generics, bindings))
                    && match_template(ret, actual_ret, generics, bindings)
            }
            _ => false,
        },
    }
}

fn bind_wildcards(template: &TypeExpr, generics: &[Name], bindings: &mut Bindings) {
    visit_names(template, &mut |name| {
        if generics.contains(name) {
            bindings
                .entry(name.clone())
                .or_insert(TypeExpr::Wildcard);
        }
    });
}

/// Every simple name in a type expression, in source order.
pub fn visit_names(ty: &TypeExpr, f: &mut impl FnMut(&Name)) {
    match ty {
        TypeExpr::Simple(name) => f(name),
        TypeExpr::Generic { base, args } => {
            visit_names(base, f);
            for arg in args {
                visit_names(arg, f);
            }
        }
        TypeExpr::Function { params, ret } => {
            for param in params {
                visit_names(param, f);
            }
            visit_names(ret, f);
        }
        TypeExpr::Nullable(inner) | TypeExpr::Result(inner) => visit_names(inner, f),
        TypeExpr::Union(members) => {
            for member in members {
                visit_names(member, f);
            }
        }
        TypeExpr::Wildcard => {}
    }
}

/// Whether any of `generics` occurs in `ty`.
pub fn uses_generics(ty: &TypeExpr, generics: &[Name]) -> bool {
    let mut found = false;
    visit_names(ty, &mut |name| found |= generics.contains(name));
    found
}

/// Number of concrete nodes in a target template.
pub fn template_score(ty: &TypeExpr, generics: &[Name]) -> usize {
    match ty {
        TypeExpr::Simple(name) => usize::from(!generics.contains(name)),
        TypeExpr::Generic { base, args } => {
            template_score(base, generics)
                + args
                    .iter()
                    .map(|arg| template_score(arg, generics))
                    .sum::<usize>()
        }
        TypeExpr::Function { params, ret } => {
            1 + params
                .iter()
                .map(|p| template_score(p, generics))
                .sum::<usize>()
                + template_score(ret, generics)
        }
        TypeExpr::Nullable(inner) | TypeExpr::Result(inner) => 1 + template_score(inner, generics),
        TypeExpr::Union(members) => members.iter().map(|m| template_score(m, generics)).sum(),
        TypeExpr::Wildcard => 0,
    }
}

/// Substitute bound generic names.
pub fn substitute(ty: &TypeExpr, bindings: &Bindings) -> TypeExpr {
    match ty {
        TypeExpr::Simple(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        TypeExpr::Generic { base, args } => TypeExpr::Generic {
            base: Box::new(substitute(base, bindings)),
            args: args.iter().map(|arg| substitute(arg, bindings)).collect(),
        },
        TypeExpr::Function { params, ret } => TypeExpr::Function {
            params: params.iter().map(|p| substitute(p, bindings)).collect(),
            ret: Box::new(substitute(ret, bindings)),
        },
        TypeExpr::Nullable(inner) => TypeExpr::Nullable(Box::new(substitute(inner, bindings))),
        TypeExpr::Result(inner) => TypeExpr::Result(Box::new(substitute(inner, bindings))),
        TypeExpr::Union(members) => {
            TypeExpr::Union(members.iter().map(|m| substitute(m, bindings)).collect())
        }
        TypeExpr::Wildcard => TypeExpr::Wildcard,
    }
}

impl TypeRegistry {
    /// Whether `value` conforms to the written type `ty`.
    ///
    /// Integers match any integer kind that can hold them and any float
    /// kind; [`TypeRegistry::coerce_to_type`] performs the conversion.
    pub fn value_matches_type(&self, value: &Value, ty: &TypeExpr) -> bool {
        match ty {
            TypeExpr::Wildcard => true,
            TypeExpr::Simple(name) => self.value_matches_name(value, name),
            TypeExpr::Generic { base, args } => {
                let Some(base_name) = base.base_name() else {
                    return false;
                };
                match (value.underlying(), canonical_name(base_name.as_str())) {
                    (Value::Array(items), "Array") => match args.as_slice() {
                        [element] => items
                            .snapshot()
                            .iter()
                            .all(|item| self.value_matches_type(item, element)),
                        _ => true,
                    },
                    (Value::Struct(inst), name) if inst.definition.name == name => {
                        let generics = self.free_type_variables(ty);
                        match_template(ty, &runtime_type(value), &generics, &mut Bindings::default())
                    }
                    _ => self.value_matches_name(value, base_name),
                }
            }
            TypeExpr::Nullable(inner) => value.is_nil() || self.value_matches_type(value, inner),
            TypeExpr::Result(inner) => {
                matches!(value.underlying(), Value::Error(_)) || self.value_matches_type(value, inner)
            }
            TypeExpr::Union(members) => members.iter().any(|m| self.value_matches_type(value, m)),
            TypeExpr::Function { .. } => value.is_callable(),
        }
    }

    fn value_matches_name(&self, value: &Value, name: &Name) -> bool {
        let value = value.underlying();
        let name_str = canonical_name(name.as_str());
        if let Some(ty) = IntegerType::from_name(name_str) {
            return match value {
                Value::Integer(i) => i.retag(ty).is_ok(),
                _ => false,
            };
        }
        if FloatType::from_name(name_str).is_some() {
            return value.is_numeric();
        }
        match (name_str, value) {
            ("bool", Value::Bool(_))
            | ("char", Value::Char(_))
            | ("String", Value::String(_))
            | ("nil", Value::Nil)
            | ("void", Value::Void)
            | ("Array", Value::Array(_))
            | ("Range", Value::Range(_))
            | ("Error", Value::Error(_))
            | ("Iterator", Value::Iterator(_))
            | ("ProcHandle", Value::Proc(_))
            | ("Future", Value::Future(_))
            | ("Channel", Value::Channel(_))
            | ("Mutex", Value::Mutex(_)) => return true,
            _ => {}
        }
        if let Some(def) = self.union(name_str) {
            return def
                .variants
                .iter()
                .any(|variant| self.value_matches_type(value, variant));
        }
        if self.interface(name_str).is_some() {
            return self.implements(&runtime_type(value), name_str);
        }
        if name.is_type_variable_like() && !self.is_known_type(name_str) {
            return true;
        }
        names_match(value.type_name(), name_str)
    }

    /// Type-variable-like names in `ty` that do not name a registered type.
    pub fn free_type_variables(&self, ty: &TypeExpr) -> Vec<Name> {
        let mut out: Vec<Name> = Vec::new();
        visit_names(ty, &mut |name| {
            if name.is_type_variable_like()
                && !self.is_known_type(name.as_str())
                && !out.contains(name)
            {
                out.push(name.clone());
            }
        });
        out
    }

    /// Convert a value that matched `ty` into that type's representation.
    pub fn coerce_to_type(&self, value: Value, ty: &TypeExpr) -> EvalResult {
        let TypeExpr::Simple(name) = ty else {
            return Ok(value);
        };
        let name_str = canonical_name(name.as_str());
        if let Some(int_ty) = IntegerType::from_name(name_str) {
            if let Value::Integer(i) = value.underlying() {
                return i.retag(int_ty).map(Value::Integer);
            }
            return Ok(value);
        }
        if let Some(float_ty) = FloatType::from_name(name_str) {
            return Ok(match value.underlying() {
                Value::Integer(i) => Value::Float(FloatValue::new(i.to_f64(), float_ty)),
                Value::Float(f) => Value::Float(FloatValue::new(f.value(), float_ty)),
                _ => value,
            });
        }
        if self.interface(name_str).is_some() {
            if let Value::Interface(existing) = &value {
                if existing.interface == name_str {
                    return Ok(value);
                }
            }
            let underlying = value.underlying().clone();
            return Ok(Value::Interface(Arc::new(InterfaceValue::new(
                name.clone(),
                underlying,
            ))));
        }
        Ok(value)
    }
}
