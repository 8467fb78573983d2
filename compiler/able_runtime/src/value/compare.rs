//! Structural equality and three-way ordering.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{StructFields, Value};

/// Tolerance for float equality.
pub const FLOAT_EPSILON: f64 = 1e-9;

fn floats_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < FLOAT_EPSILON
}

/// Structural equality.
///
/// Numbers compare by value regardless of kind. Arrays and structs compare
/// element-wise, errors by message and payload. Callables, handles, and
/// namespaces compare by identity.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Interface(iv), other) | (other, Value::Interface(iv)) => {
            values_equal(&iv.underlying, other)
        }
        (Value::Nil, Value::Nil)
        | (Value::Void, Value::Void)
        | (Value::IteratorEnd, Value::IteratorEnd) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x.cmp_value(*y) == Ordering::Equal,
        (Value::Float(x), Value::Float(y)) => floats_equal(x.value(), y.value()),
        (Value::Integer(i), Value::Float(x)) | (Value::Float(x), Value::Integer(i)) => {
            floats_equal(i.to_f64(), x.value())
        }
        (Value::Array(x), Value::Array(y)) => {
            if x.ptr_eq(y) {
                return true;
            }
            let (xs, ys) = (x.snapshot(), y.snapshot());
            xs.len() == ys.len() && xs.iter().zip(&ys).all(|(l, r)| values_equal(l, r))
        }
        (Value::Range(x), Value::Range(y)) => {
            x.inclusive == y.inclusive
                && x.start.cmp_value(y.start) == Ordering::Equal
                && x.end.cmp_value(y.end) == Ordering::Equal
        }
        (Value::Struct(x), Value::Struct(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            if x.definition.name != y.definition.name {
                return false;
            }
            match (x.fields(), y.fields()) {
                (StructFields::Named(xs), StructFields::Named(ys)) => {
                    xs.len() == ys.len()
                        && xs.iter().all(|(name, value)| {
                            ys.iter()
                                .find(|(other, _)| other == name)
                                .is_some_and(|(_, other)| values_equal(value, other))
                        })
                }
                (StructFields::Positional(xs), StructFields::Positional(ys)) => {
                    xs.len() == ys.len() && xs.iter().zip(&ys).all(|(l, r)| values_equal(l, r))
                }
                _ => false,
            }
        }
        (Value::Error(x), Value::Error(y)) => {
            x.message == y.message
                && x.payload.len() == y.payload.len()
                && x.payload.iter().all(|(name, value)| {
                    y.field(name.as_str())
                        .is_some_and(|other| values_equal(value, other))
                })
        }
        (Value::StructDefinition(x), Value::StructDefinition(y)) => Arc::ptr_eq(x, y),
        (Value::UnionDefinition(x), Value::UnionDefinition(y)) => Arc::ptr_eq(x, y),
        (Value::InterfaceDefinition(x), Value::InterfaceDefinition(y)) => Arc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Arc::ptr_eq(x, y),
        (Value::Native(x), Value::Native(y)) => Arc::ptr_eq(x, y),
        (Value::Proc(x), Value::Proc(y)) | (Value::Future(x), Value::Future(y)) => x.ptr_eq(y),
        (Value::Package(x), Value::Package(y)) => x.name == y.name,
        (Value::Channel(x), Value::Channel(y)) => x.id() == y.id(),
        (Value::Mutex(x), Value::Mutex(y)) => x.id() == y.id(),
        _ => false,
    }
}

/// Three-way comparison for ordering operators.
///
/// `None` when the operands have no ordering: different non-numeric types,
/// or types without a natural order.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.underlying(), b.underlying()) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp_value(*y)),
        (Value::Float(_) | Value::Integer(_), Value::Float(_) | Value::Integer(_)) => {
            let (x, y) = (a.underlying().as_f64()?, b.underlying().as_f64()?);
            if floats_equal(x, y) {
                Some(Ordering::Equal)
            } else {
                x.partial_cmp(&y)
            }
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Char(x), Value::Char(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
