//! Expression evaluation helpers: literals, indexing, ranges, string
//! interpolation, and the values `raise` produces.

use able_ir::ast::{FloatType, IntegerType, Literal};
use able_runtime::errors::{index_out_of_bounds, type_mismatch};
use able_runtime::value::{ArrayRef, ErrorValue, FloatValue, RangeValue, StructFields};
use able_runtime::{EvalError, EvalResult, Value};

/// Value of a literal node. Integer literals are range-checked against
/// their suffix (`i32` when unsuffixed).
pub fn literal_value(lit: &Literal) -> EvalResult {
    Ok(match lit {
        Literal::Nil => Value::Nil,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Char(c) => Value::Char(*c),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Integer { value, suffix } => {
            return Value::integer(*value, suffix.unwrap_or(IntegerType::I32));
        }
        Literal::Float { value, suffix } => {
            Value::Float(FloatValue::new(*value, suffix.unwrap_or(FloatType::F64)))
        }
    })
}

/// Resolve an array index, bounds-checked.
pub fn array_index(items: &ArrayRef, index: &Value) -> Result<usize, EvalError> {
    let Some(raw) = index.underlying().as_integer() else {
        return Err(type_mismatch("integer index", index.type_name()));
    };
    let len = items.len();
    raw.to_u128()
        .and_then(|i| usize::try_from(i).ok())
        .filter(|&i| i < len)
        .ok_or_else(|| index_out_of_bounds(raw.to_i128().unwrap_or(i128::MAX), len))
}

/// `a..b` (inclusive) or `a...b` (exclusive) over integer bounds.
pub fn make_range(start: &Value, end: &Value, inclusive: bool) -> EvalResult {
    match (start.underlying().as_integer(), end.underlying().as_integer()) {
        (Some(start), Some(end)) => Ok(Value::Range(RangeValue {
            start,
            end,
            inclusive,
        })),
        _ => Err(EvalError::new(format!(
            "Range bounds must be integers, got {} and {}",
            start.type_name(),
            end.type_name()
        ))),
    }
}

/// Concatenate interpolated parts with their display form.
pub fn interpolate(parts: &[Value]) -> Value {
    let mut out = String::new();
    for part in parts {
        out.push_str(&part.to_string());
    }
    Value::string(out)
}

/// Normalize a raised value into an error value.
///
/// Error values pass through and strings become the message. Anything
/// else is carried in the `value` payload field; a struct also lends its
/// type name and named fields so rescue clauses can destructure it.
pub fn raise_value(value: Value) -> Value {
    match value {
        Value::Error(_) => value,
        Value::String(message) => Value::error(message.to_string()),
        Value::Struct(ref inst) => {
            let mut error =
                ErrorValue::new(value.to_string()).with_type(inst.definition.name.clone());
            if let StructFields::Named(fields) = inst.fields() {
                for (name, field) in fields {
                    error = error.with_field(name, field);
                }
            }
            Value::error_value(error.with_field("value", value.clone()))
        }
        other => Value::error_value(ErrorValue::new(other.to_string()).with_field("value", other)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
