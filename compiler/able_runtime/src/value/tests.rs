use std::cmp::Ordering;
use std::sync::Arc;

use able_ir::ast::{build, FloatType, IntegerType, Stmt};
use proptest::prelude::*;

use super::*;
use crate::environment::Environment;
use crate::iterator::{ArrayIterator, IteratorSource, RangeIterator, StringIterator};
use pretty_assertions::assert_eq;

/// Context for sources that never call back into the interpreter.
struct NoCalls(Environment);

impl CallContext for NoCalls {
    fn env(&self) -> &Environment {
        &self.0
    }

    fn call(&mut self, _callee: &Value, _args: Vec<Value>) -> EvalResult {
        Ok(Value::Nil)
    }

    fn call_method(&mut self, _receiver: &Value, _method: &str, _args: Vec<Value>) -> EvalResult {
        Ok(Value::Nil)
    }
}

fn drain(source: &dyn IteratorSource) -> Vec<Value> {
    let mut ctx = NoCalls(Environment::new());
    let mut out = Vec::new();
    loop {
        match source.next(&mut ctx).unwrap() {
            Value::IteratorEnd => return out,
            value => out.push(value),
        }
    }
}

fn definition(stmt: Stmt) -> Arc<StructDefinition> {
    match stmt {
        Stmt::Struct(def) => def,
        other => panic!("expected struct definition, got {other:?}"),
    }
}

fn int(value: i128, ty: IntegerType) -> IntegerValue {
    IntegerValue::new(value, ty).unwrap()
}

// Integer promotion

#[test]
fn same_signedness_picks_wider() {
    assert_eq!(
        promote_integer_types(IntegerType::I8, IntegerType::I64).unwrap(),
        IntegerType::I64
    );
    assert_eq!(
        promote_integer_types(IntegerType::U32, IntegerType::U16).unwrap(),
        IntegerType::U32
    );
}

#[test]
fn mixed_signedness_adds_a_bit() {
    assert_eq!(
        promote_integer_types(IntegerType::I32, IntegerType::U32).unwrap(),
        IntegerType::I64
    );
    assert_eq!(
        promote_integer_types(IntegerType::U8, IntegerType::I8).unwrap(),
        IntegerType::I16
    );
    assert_eq!(
        promote_integer_types(IntegerType::I64, IntegerType::U128).unwrap(),
        IntegerType::U128
    );
}

#[test]
fn mixed_signedness_beyond_128_bits_errors() {
    let err = promote_integer_types(IntegerType::I128, IntegerType::U64).unwrap_err();
    assert_eq!(err.message, "integer operands exceed supported widths");
}

#[test]
fn checked_add_overflows_in_result_kind() {
    let a = int(120, IntegerType::I8);
    let b = int(10, IntegerType::I8);
    assert_eq!(a.checked_add(b).unwrap_err().message, "integer overflow");

    let c = int(10, IntegerType::I16);
    assert_eq!(a.checked_add(c).unwrap().to_i128(), Some(130));
    assert_eq!(a.checked_add(c).unwrap().ty(), IntegerType::I16);
}

#[test]
fn division_truncates_and_remainder_follows_dividend() {
    let a = IntegerValue::from_i32(-7);
    let b = IntegerValue::from_i32(2);
    assert_eq!(a.checked_div(b).unwrap().to_i128(), Some(-3));
    assert_eq!(a.checked_rem(b).unwrap().to_i128(), Some(-1));
}

#[test]
fn unsigned_rejects_negative() {
    assert!(IntegerValue::new(-1, IntegerType::U8).is_err());
    assert!(IntegerValue::new(255, IntegerType::U8).is_ok());
    assert!(IntegerValue::new(256, IntegerType::U8).is_err());
    assert!(IntegerValue::new(i128::MIN, IntegerType::I128).is_ok());
}

#[test]
fn u128_reaches_its_full_range() {
    let top_signed = int(i128::MAX, IntegerType::U128);
    let one = int(1, IntegerType::U128);
    let past = top_signed.checked_add(one).unwrap();
    assert_eq!(past.to_u128(), Some(1u128 << 127));
    assert_eq!(past.to_i128(), None);
    assert_eq!(past.to_string(), "170141183460469231731687303715884105728");
    assert_eq!(past.cmp_value(top_signed), Ordering::Greater);

    let max = IntegerValue::from_u128(u128::MAX, IntegerType::U128).unwrap();
    assert_eq!(max.to_string(), u128::MAX.to_string());
    assert_eq!(max.checked_add(one).unwrap_err().message, "integer overflow");
    assert_eq!(max.checked_sub(one).unwrap().to_u128(), Some(u128::MAX - 1));
    assert_eq!(max.checked_div(past).unwrap().to_u128(), Some(1));
    assert!(IntegerValue::from_u128(u128::MAX, IntegerType::I128).is_err());
}

#[test]
fn i128_extremes_stay_in_range() {
    let min = int(i128::MIN, IntegerType::I128);
    assert_eq!(min.checked_neg().unwrap_err().message, "integer overflow");
    assert_eq!(min.to_i128(), Some(i128::MIN));
    assert_eq!(min.to_string(), i128::MIN.to_string());
    let minus_one = int(-1, IntegerType::I128);
    assert_eq!(min.checked_sub(minus_one).unwrap().to_i128(), Some(i128::MIN + 1));
    assert_eq!(min.checked_mul(minus_one).unwrap_err().message, "integer overflow");
}

#[test]
fn f32_values_are_rounded() {
    let x = FloatValue::new(0.1, FloatType::F32);
    assert!((x.value() - 0.1).abs() > 0.0);
    assert_eq!(FloatValue::join(FloatType::F32, FloatType::F32), FloatType::F32);
    assert_eq!(FloatValue::join(FloatType::F32, FloatType::F64), FloatType::F64);
}

proptest! {
    #[test]
    fn i32_addition_matches_checked_i32(a in any::<i32>(), b in any::<i32>()) {
        let result = IntegerValue::from_i32(a).checked_add(IntegerValue::from_i32(b));
        match a.checked_add(b) {
            Some(sum) => prop_assert_eq!(result.unwrap().to_i128(), Some(i128::from(sum))),
            None => prop_assert!(result.is_err()),
        }
    }

    #[test]
    fn mixed_kinds_promote_symmetrically(a in 0usize..10, b in 0usize..10) {
        let (x, y) = (IntegerType::ALL[a], IntegerType::ALL[b]);
        let forward = promote_integer_types(x, y).ok();
        let backward = promote_integer_types(y, x).ok();
        prop_assert_eq!(forward, backward);
        if let Some(ty) = forward {
            prop_assert!(ty.bits() >= x.bits().min(y.bits()));
        }
    }

    #[test]
    fn ints_equal_across_kinds(v in 0i128..=127) {
        let a = Value::Integer(int(v, IntegerType::I8));
        let b = Value::Integer(int(v, IntegerType::U64));
        prop_assert_eq!(a, b);
    }
}

// Equality and ordering

#[test]
fn arrays_compare_structurally() {
    let a = Value::array(vec![Value::i32(1), Value::string("x")]);
    let b = Value::array(vec![Value::i32(1), Value::string("x")]);
    assert_eq!(a, b);
    assert_ne!(a, Value::array(vec![Value::i32(1)]));
}

#[test]
fn int_and_float_compare_by_value() {
    assert_eq!(Value::i32(2), Value::f64(2.0));
    assert_eq!(
        compare_values(&Value::i32(1), &Value::f64(1.5)),
        Some(Ordering::Less)
    );
    assert_eq!(
        compare_values(&Value::string("a"), &Value::string("b")),
        Some(Ordering::Less)
    );
    assert_eq!(compare_values(&Value::string("a"), &Value::i32(1)), None);
}

#[test]
fn equal_composites_still_have_no_ordering() {
    let a = Value::array(vec![Value::i32(1)]);
    let b = Value::array(vec![Value::i32(1)]);
    assert_eq!(a, b);
    assert_eq!(compare_values(&a, &b), None);
    assert_eq!(compare_values(&Value::Nil, &Value::Nil), None);
}

#[test]
fn errors_compare_by_message_and_payload() {
    let a = Value::error_value(ErrorValue::new("bad").with_field("code", Value::i32(1)));
    let b = Value::error_value(ErrorValue::new("bad").with_field("code", Value::i32(1)));
    let c = Value::error_value(ErrorValue::new("bad").with_field("code", Value::i32(2)));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn structs_compare_by_fields() {
    let def = definition(build::struct_def("Point", &[("x", build::ty("i32"))]));
    let make = |x| {
        Value::struct_instance(StructInstance::new(
            Arc::clone(&def),
            StructFields::Named(vec![(Name::new("x"), Value::i32(x))]),
            Vec::new(),
        ))
    };
    assert_eq!(make(1), make(1));
    assert_ne!(make(1), make(2));
}

// Truthiness and display

#[test]
fn truthiness() {
    assert!(!Value::Nil.is_truthy());
    assert!(!Value::Bool(false).is_truthy());
    assert!(!Value::error("e").is_truthy());
    assert!(Value::i32(0).is_truthy());
    assert!(Value::string("").is_truthy());
}

#[test]
fn display_values() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::f64(2.5).to_string(), "2.5");
    assert_eq!(
        Value::array(vec![Value::i32(1), Value::string("a")]).to_string(),
        "[1, a]"
    );
    let range = RangeValue {
        start: IntegerValue::from_i32(1),
        end: IntegerValue::from_i32(3),
        inclusive: false,
    };
    assert_eq!(Value::Range(range).to_string(), "1...3");

    let def = definition(build::struct_def(
        "Point",
        &[("x", build::ty("i32")), ("y", build::ty("i32"))],
    ));
    let point = Value::struct_instance(StructInstance::new(
        def,
        StructFields::Named(vec![
            (Name::new("x"), Value::i32(1)),
            (Name::new("y"), Value::i32(2)),
        ]),
        Vec::new(),
    ));
    assert_eq!(point.to_string(), "Point { x: 1, y: 2 }");
    assert_eq!(point.type_name(), "Point");
}

// Struct fields

#[test]
fn struct_field_kind_is_fixed() {
    let def = definition(build::positional_struct_def("Pair", vec![build::ty("i32"), build::ty("i32")]));
    let pair = StructInstance::new(
        def,
        StructFields::Positional(vec![Value::i32(1), Value::i32(2)]),
        Vec::new(),
    );
    assert!(pair.is_positional());
    assert!(!pair.set_field("x", Value::i32(5)));
    assert!(pair.set_positional(1, Value::i32(5)));
    assert_eq!(pair.positional(1), Some(Value::i32(5)));
    assert_eq!(pair.field("x"), None);
}

// Partial application

#[test]
fn partial_fill_orders_holes() {
    let partial = PartialFunction {
        target: Value::Nil,
        slots: vec![
            ArgSlot::Hole(Some(2)),
            ArgSlot::Bound(Value::i32(0)),
            ArgSlot::Hole(Some(1)),
        ],
    };
    assert_eq!(partial.arity(), 2);
    let filled = partial.fill(&[Value::i32(10), Value::i32(20)]).unwrap();
    assert_eq!(filled, vec![Value::i32(20), Value::i32(0), Value::i32(10)]);

    let anonymous = PartialFunction {
        target: Value::Nil,
        slots: vec![ArgSlot::Hole(None), ArgSlot::Hole(None)],
    };
    assert_eq!(anonymous.fill(&[Value::i32(1)]), None);
}

// Iterator sources

#[test]
fn range_iterator_counts_both_ways() {
    let up = RangeValue {
        start: IntegerValue::from_i32(1),
        end: IntegerValue::from_i32(3),
        inclusive: true,
    };
    assert_eq!(
        drain(&RangeIterator::new(up)),
        vec![Value::i32(1), Value::i32(2), Value::i32(3)]
    );

    let down = RangeValue {
        start: IntegerValue::from_i32(3),
        end: IntegerValue::from_i32(0),
        inclusive: false,
    };
    assert_eq!(
        drain(&RangeIterator::new(down)),
        vec![Value::i32(3), Value::i32(2), Value::i32(1)]
    );
}

#[test]
fn range_iterator_stops_at_the_kind_maximum() {
    let range = RangeValue {
        start: int(254, IntegerType::U8),
        end: int(255, IntegerType::U8),
        inclusive: true,
    };
    assert_eq!(
        drain(&RangeIterator::new(range)),
        vec![
            Value::integer(254, IntegerType::U8).unwrap(),
            Value::integer(255, IntegerType::U8).unwrap(),
        ]
    );
}

#[test]
fn range_iterator_overflows_past_the_start_kind() {
    let range = RangeValue {
        start: int(127, IntegerType::I8),
        end: int(200, IntegerType::I32),
        inclusive: true,
    };
    let source = RangeIterator::new(range);
    let mut ctx = NoCalls(Environment::new());
    assert_eq!(
        source.next(&mut ctx).unwrap(),
        Value::integer(127, IntegerType::I8).unwrap()
    );
    assert_eq!(source.next(&mut ctx).unwrap_err().message, "integer overflow");
}

#[test]
fn array_and_string_iterators() {
    let array = ArrayRef::new(vec![Value::i32(1), Value::i32(2)]);
    assert_eq!(drain(&ArrayIterator::new(array)).len(), 2);
    assert_eq!(
        drain(&StringIterator::new("ab")),
        vec![Value::Char('a'), Value::Char('b')]
    );
}

#[test]
fn closed_iterator_reports_end() {
    let source = ArrayIterator::new(ArrayRef::new(vec![Value::i32(1)]));
    source.close();
    assert!(drain(&source).is_empty());
}
