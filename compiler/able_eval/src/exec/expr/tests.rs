use able_ir::ast::{IntegerType, Literal};
use able_runtime::value::ArrayRef;
use able_runtime::{EvalErrorKind, Value};
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn unsuffixed_integer_literal_is_i32() {
    let value = literal_value(&Literal::Integer {
        value: 5,
        suffix: None,
    })
    .unwrap();
    assert_eq!(value.as_integer().unwrap().ty(), IntegerType::I32);
}

#[test]
fn out_of_range_literal_overflows() {
    let err = literal_value(&Literal::Integer {
        value: 300,
        suffix: Some(IntegerType::U8),
    })
    .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::IntegerOverflow);
}

#[test]
fn array_index_is_bounds_checked() {
    let items = ArrayRef::new(vec![Value::i32(10), Value::i32(20)]);
    assert_eq!(array_index(&items, &Value::i32(1)).unwrap(), 1);

    let err = array_index(&items, &Value::i32(2)).unwrap_err();
    assert_eq!(err.message, "Array index out of bounds");
    let err = array_index(&items, &Value::i32(-1)).unwrap_err();
    assert_eq!(err.message, "Array index out of bounds");
}

#[test]
fn range_requires_integer_bounds() {
    assert!(matches!(
        make_range(&Value::i32(1), &Value::i32(3), true).unwrap(),
        Value::Range(r) if r.inclusive
    ));
    assert!(make_range(&Value::f64(1.0), &Value::i32(3), true).is_err());
}

#[test]
fn interpolation_uses_display_form() {
    let parts = [Value::string("x = "), Value::i32(3), Value::string("!")];
    assert_eq!(interpolate(&parts), Value::string("x = 3!"));
}

#[test]
fn raise_normalizes_values() {
    let Value::Error(from_string) = raise_value(Value::string("boom")) else {
        panic!("expected error value");
    };
    assert_eq!(from_string.message, "boom");
    assert!(from_string.payload.is_empty());

    let Value::Error(from_int) = raise_value(Value::i32(42)) else {
        panic!("expected error value");
    };
    assert_eq!(from_int.message, "42");
    assert_eq!(from_int.field("value"), Some(&Value::i32(42)));

    let original = Value::error("kept");
    assert_eq!(raise_value(original.clone()), original);
}
