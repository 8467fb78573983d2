//! Unary operator implementations.

use able_ir::ast::{IntegerType, UnaryOp};
use able_runtime::errors::unary_type_mismatch;
use able_runtime::value::FloatValue;
use able_runtime::{EvalResult, Value};

/// Evaluate `op operand`.
///
/// `-` negates any number with a range check; `!` needs a bool; `~` is
/// bitwise not on `i32`.
pub fn evaluate_unary(operand: &Value, op: UnaryOp) -> EvalResult {
    let operand = operand.underlying();
    match (op, operand) {
        (UnaryOp::Neg, Value::Integer(i)) => Ok(Value::Integer(i.checked_neg()?)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(FloatValue::new(-f.value(), f.ty()))),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::BitNot, Value::Integer(i)) if i.ty() == IntegerType::I32 => i
            .as_i32()
            .map(|v| Value::i32(!v))
            .ok_or_else(|| unary_type_mismatch(op.as_symbol(), operand.type_name())),
        _ => Err(unary_type_mismatch(op.as_symbol(), operand.type_name())),
    }
}
