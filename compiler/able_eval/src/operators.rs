//! Binary operators over evaluated operands.
//!
//! The evaluator short-circuits `&&` and `||` itself; everything else lands
//! here once both sides are values. Dispatch is a direct match on the
//! operand pair since the numeric tower is fixed.

use std::cmp::Ordering;

use able_ir::ast::{BinaryOp, FloatType, IntegerType};
use able_runtime::errors::{
    arithmetic_requires_numeric, bitwise_requires_i32, division_by_zero, incomparable_values,
    logical_requires_bool, shift_out_of_range,
};
use able_runtime::value::{compare_values, values_equal, FloatValue, IntegerValue};
use able_runtime::{EvalError, EvalResult, Value};

/// Evaluate `left op right`.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    let (left, right) = (left.underlying(), right.underlying());
    if op.is_comparison() {
        return eval_comparison(left, right, op);
    }
    if op.is_bitwise() {
        return eval_bitwise(left, right, op);
    }
    match op {
        BinaryOp::And | BinaryOp::Or => eval_logical(left, right, op),
        _ => eval_arithmetic(left, right, op),
    }
}

/// `a <=> b`, used by comparisons and by sorting natives.
pub fn three_way(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    compare_values(left, right)
        .ok_or_else(|| incomparable_values(left.type_name(), right.type_name()))
}

fn eval_comparison(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    let result = match op {
        BinaryOp::Eq => values_equal(left, right),
        BinaryOp::NotEq => !values_equal(left, right),
        _ => {
            let ordering = three_way(left, right)?;
            match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::LtEq => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }
        }
    };
    Ok(Value::Bool(result))
}

fn eval_logical(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And {
            *a && *b
        } else {
            *a || *b
        })),
        _ => Err(logical_requires_bool(op.as_symbol())),
    }
}

fn eval_arithmetic(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match (left, right) {
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(joined))
        }
        (Value::Integer(a), Value::Integer(b)) => eval_int_arithmetic(*a, *b, op),
        (Value::Float(a), Value::Float(b)) => {
            eval_float_arithmetic(a.value(), b.value(), FloatValue::join(a.ty(), b.ty()), op)
        }
        (Value::Integer(a), Value::Float(b)) => eval_float_arithmetic(a.to_f64(), b.value(), b.ty(), op),
        (Value::Float(a), Value::Integer(b)) => eval_float_arithmetic(a.value(), b.to_f64(), a.ty(), op),
        _ => Err(arithmetic_requires_numeric()),
    }
}

fn eval_int_arithmetic(a: IntegerValue, b: IntegerValue, op: BinaryOp) -> EvalResult {
    let result = match op {
        BinaryOp::Add => a.checked_add(b)?,
        BinaryOp::Sub => a.checked_sub(b)?,
        BinaryOp::Mul => a.checked_mul(b)?,
        BinaryOp::Div | BinaryOp::Mod if b.is_zero() => return Err(division_by_zero()),
        BinaryOp::Div => a.checked_div(b)?,
        BinaryOp::Mod => a.checked_rem(b)?,
        _ => return Err(arithmetic_requires_numeric()),
    };
    Ok(Value::Integer(result))
}

fn eval_float_arithmetic(a: f64, b: f64, ty: FloatType, op: BinaryOp) -> EvalResult {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => return Err(division_by_zero()),
        BinaryOp::Div => a / b,
        // Rust's `%` on floats is fmod: the sign follows the dividend.
        BinaryOp::Mod => a % b,
        _ => return Err(arithmetic_requires_numeric()),
    };
    Ok(Value::Float(FloatValue::new(value, ty)))
}

fn eval_bitwise(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    let (Some(a), Some(b)) = (as_i32_operand(left), as_i32_operand(right)) else {
        return Err(bitwise_requires_i32());
    };
    let result = match op {
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Shl | BinaryOp::Shr => {
            let amount = u32::try_from(b)
                .ok()
                .filter(|amount| *amount < 32)
                .ok_or_else(shift_out_of_range)?;
            if op == BinaryOp::Shl {
                a.wrapping_shl(amount)
            } else {
                a.wrapping_shr(amount)
            }
        }
        _ => return Err(bitwise_requires_i32()),
    };
    Ok(Value::i32(result))
}

fn as_i32_operand(value: &Value) -> Option<i32> {
    match value {
        Value::Integer(int) if int.ty() == IntegerType::I32 => int.as_i32(),
        _ => None,
    }
}
