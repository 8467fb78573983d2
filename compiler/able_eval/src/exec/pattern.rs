//! Structural pattern matching.
//!
//! A match either succeeds with the bindings it produced, in pattern order,
//! or fails with a [`Mismatch`]. `match` and `rescue` treat a mismatch as
//! "try the next clause"; destructuring assignment and parameter binding
//! turn it into an error through `From<Mismatch> for EvalError`.
//!
//! Error values take part in struct patterns through a struct-like view:
//! `message` plus their payload fields, under their type name or `Error`.

use able_ir::ast::{ArrayRest, Pattern, StructKind, StructPattern, StructPatternField};
use able_ir::Name;
use able_runtime::errors::pattern_mismatch;
use able_runtime::value::{values_equal, ErrorValue, StructFields, StructInstance};
use able_runtime::{EvalError, Value};

use super::expr::literal_value;
use crate::resolver::TypeRegistry;

/// Names bound by a successful match, in pattern order.
pub type PatternBindings = Vec<(Name, Value)>;

/// Why a value did not match a pattern.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("Array length mismatch in destructuring")]
    ArrayLength,
    #[error("Cannot destructure {0} as an array")]
    NotArray(String),
    #[error("Struct type mismatch in destructuring")]
    StructType,
    #[error("Struct field count mismatch")]
    FieldCount,
    #[error("Expected positional struct")]
    NotPositional,
    #[error("Missing field '{0}' during destructuring")]
    MissingField(Name),
    #[error("pattern literal mismatch")]
    Literal,
    #[error("Typed pattern mismatch")]
    Typed,
}

impl From<Mismatch> for EvalError {
    fn from(mismatch: Mismatch) -> Self {
        pattern_mismatch(mismatch.to_string())
    }
}

/// Match `value` against `pattern`.
pub fn match_pattern(
    registry: &TypeRegistry,
    pattern: &Pattern,
    value: &Value,
) -> Result<PatternBindings, Mismatch> {
    let mut out = PatternBindings::new();
    bind(registry, pattern, value, &mut out)?;
    Ok(out)
}

fn bind(
    registry: &TypeRegistry,
    pattern: &Pattern,
    value: &Value,
    out: &mut PatternBindings,
) -> Result<(), Mismatch> {
    match pattern {
        Pattern::Identifier(name) => {
            // A singleton struct name matches its instance instead of binding.
            if let Some(def) = registry.struct_def(name.as_str()) {
                if def.kind == StructKind::Singleton {
                    return match value.underlying() {
                        Value::Struct(inst) if inst.definition.name == *name => Ok(()),
                        _ => Err(Mismatch::StructType),
                    };
                }
            }
            out.push((name.clone(), value.clone()));
            Ok(())
        }
        Pattern::Wildcard => Ok(()),
        Pattern::Literal(lit) => {
            let expected = literal_value(lit).map_err(|_| Mismatch::Literal)?;
            if values_equal(&expected, value.underlying()) {
                Ok(())
            } else {
                Err(Mismatch::Literal)
            }
        }
        Pattern::Struct(sp) => bind_struct(registry, sp, value, out),
        Pattern::Array { elements, rest } => {
            let Value::Array(items) = value.underlying() else {
                return Err(Mismatch::NotArray(value.type_name().to_string()));
            };
            let items = items.snapshot();
            let fits = match rest {
                Some(_) => items.len() >= elements.len(),
                None => items.len() == elements.len(),
            };
            if !fits {
                return Err(Mismatch::ArrayLength);
            }
            for (element, item) in elements.iter().zip(&items) {
                bind(registry, element, item, out)?;
            }
            if let Some(ArrayRest::Bind(name)) = rest {
                let tail = items.get(elements.len()..).unwrap_or_default().to_vec();
                out.push((name.clone(), Value::array(tail)));
            }
            Ok(())
        }
        Pattern::Typed { pattern, ty } => {
            if !registry.value_matches_type(value, ty) {
                return Err(Mismatch::Typed);
            }
            let coerced = registry
                .coerce_to_type(value.clone(), ty)
                .map_err(|_| Mismatch::Typed)?;
            bind(registry, pattern, &coerced, out)
        }
    }
}

fn bind_struct(
    registry: &TypeRegistry,
    sp: &StructPattern,
    value: &Value,
    out: &mut PatternBindings,
) -> Result<(), Mismatch> {
    match value.underlying() {
        Value::Struct(inst) => {
            if sp.struct_type.as_ref().is_some_and(|ty| *ty != inst.definition.name) {
                return Err(Mismatch::StructType);
            }
            if sp.positional {
                bind_positional(registry, sp, inst, out)
            } else {
                for field in &sp.fields {
                    let name = field_name(field)?;
                    let field_value = inst
                        .field(name.as_str())
                        .ok_or_else(|| Mismatch::MissingField(name.clone()))?;
                    bind_field(registry, field, &field_value, out)?;
                }
                Ok(())
            }
        }
        Value::Error(err) => {
            if let Some(ty) = &sp.struct_type {
                let named = err.type_name.as_ref().is_some_and(|name| name == ty);
                if !named && *ty != "Error" {
                    return Err(Mismatch::StructType);
                }
            }
            if sp.positional {
                return if sp.fields.is_empty() {
                    Ok(())
                } else {
                    Err(Mismatch::FieldCount)
                };
            }
            for field in &sp.fields {
                let name = field_name(field)?;
                let field_value = error_field(err, name.as_str())
                    .ok_or_else(|| Mismatch::MissingField(name.clone()))?;
                bind_field(registry, field, &field_value, out)?;
            }
            Ok(())
        }
        _ => Err(Mismatch::StructType),
    }
}

fn bind_positional(
    registry: &TypeRegistry,
    sp: &StructPattern,
    inst: &StructInstance,
    out: &mut PatternBindings,
) -> Result<(), Mismatch> {
    let StructFields::Positional(values) = inst.fields() else {
        return Err(Mismatch::NotPositional);
    };
    let covered = if sp.has_rest {
        sp.fields.len() <= values.len()
    } else {
        sp.fields.len() == values.len()
    };
    if !covered {
        return Err(Mismatch::FieldCount);
    }
    for (field, field_value) in sp.fields.iter().zip(&values) {
        bind_field(registry, field, field_value, out)?;
    }
    Ok(())
}

fn bind_field(
    registry: &TypeRegistry,
    field: &StructPatternField,
    value: &Value,
    out: &mut PatternBindings,
) -> Result<(), Mismatch> {
    bind(registry, &field.pattern, value, out)?;
    if let Some(binding) = &field.binding {
        out.push((binding.clone(), value.clone()));
    }
    Ok(())
}

/// Field a named struct-pattern entry reads; `{ x }` is shorthand for
/// `{ x: x }`.
fn field_name(field: &StructPatternField) -> Result<&Name, Mismatch> {
    match (&field.field, &field.pattern) {
        (Some(name), _) | (None, Pattern::Identifier(name)) => Ok(name),
        _ => Err(Mismatch::FieldCount),
    }
}

/// Member of an error's struct-like view.
pub fn error_field(err: &ErrorValue, name: &str) -> Option<Value> {
    if name == "message" {
        return Some(Value::string(err.message.as_str()));
    }
    err.field(name).cloned()
}
