use able_ir::ast::build::{bin, call_named, ident, int, lambda, member, method_call, placeholder, placeholder_at};
use able_ir::ast::BinaryOp;
use able_runtime::Value;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn arity_counts_anonymous_and_numbered_markers() {
    assert_eq!(placeholder_arity(&bin(BinaryOp::Add, placeholder(), int(1))), 1);
    assert_eq!(
        placeholder_arity(&bin(BinaryOp::Mul, placeholder_at(1), placeholder_at(2))),
        2
    );
    assert_eq!(
        placeholder_arity(&bin(BinaryOp::Add, placeholder(), placeholder())),
        2
    );
    assert_eq!(
        placeholder_arity(&bin(BinaryOp::Add, placeholder(), placeholder_at(1))),
        2
    );
    assert_eq!(placeholder_arity(&placeholder_at(3)), 3);
}

#[test]
fn lambda_roots() {
    assert!(is_lambda_root(&bin(BinaryOp::Add, placeholder(), int(1))));
    assert!(is_lambda_root(&member(placeholder(), "name")));
    assert!(is_lambda_root(&method_call(placeholder(), "len", vec![])));

    // A partial call and a call that only passes a placeholder lambda on.
    assert!(!is_lambda_root(&call_named("f", vec![placeholder(), int(1)])));
    assert!(!is_lambda_root(&method_call(
        ident("xs"),
        "map",
        vec![bin(BinaryOp::Add, placeholder(), int(1))]
    )));
    // Placeholders inside a nested lambda belong to that lambda.
    assert!(!is_lambda_root(&bin(
        BinaryOp::Add,
        int(1),
        call_named("g", vec![lambda(&["x"], placeholder())])
    )));
}

#[test]
fn partial_calls_need_a_bare_marker() {
    assert!(is_partial_call(&[placeholder(), int(1)]));
    assert!(!is_partial_call(&[bin(BinaryOp::Add, placeholder(), int(1))]));
}

#[test]
fn anonymous_markers_skip_numbered_positions() {
    let body = bin(BinaryOp::Sub, placeholder(), placeholder_at(1));
    let mut frame = PlaceholderFrame::new(&body, vec![Value::i32(10), Value::i32(20)]);
    assert_eq!(frame.value_for(None).unwrap(), Value::i32(20));
    assert_eq!(frame.value_for(Some(1)).unwrap(), Value::i32(10));
    assert!(frame.value_for(Some(5)).is_err());
}
