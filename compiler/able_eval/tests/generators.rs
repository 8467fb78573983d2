//! Iterator literals consumed by `for` loops and by hand.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use able_eval::{buffer_handler, EvalErrorKind, Interpreter, Value};
use able_ir::ast::build::{
    array, bin, block, brk, call_named, compound, declare, ensure, for_in, ident, int, iterator,
    method_call, p_ident, stmt, string, while_loop, yield_stmt,
};
use able_ir::ast::{BinaryOp, Expr, Module, Stmt};
use pretty_assertions::assert_eq;

fn interpreter() -> Interpreter {
    Interpreter::builder().print_handler(buffer_handler()).build()
}

fn run(interp: &mut Interpreter, body: Vec<Stmt>) -> Result<Value, able_eval::EvalError> {
    interp.eval_module(&Module::new(body))
}

fn print(value: Expr) -> Stmt {
    stmt(call_named("print", vec![value]))
}

fn gen_yield(value: Expr) -> Stmt {
    stmt(method_call(ident("gen"), "yield", vec![value]))
}

/// Sums everything the iterator bound to `it` produces.
fn sum_of_it() -> Vec<Stmt> {
    vec![
        stmt(declare("total", int(0))),
        for_in(
            p_ident("x"),
            ident("it"),
            vec![stmt(compound(BinaryOp::Add, "total", ident("x")))],
        ),
        stmt(ident("total")),
    ]
}

#[test]
fn yields_feed_a_for_loop() {
    let mut interp = interpreter();
    let mut body = vec![stmt(declare(
        "it",
        iterator(
            None,
            vec![gen_yield(int(1)), yield_stmt(int(2)), gen_yield(int(3))],
        ),
    ))];
    body.extend(sum_of_it());
    assert_eq!(run(&mut interp, body).unwrap(), Value::i32(6));
}

#[test]
fn custom_binding_name() {
    let mut interp = interpreter();
    let mut body = vec![stmt(declare(
        "it",
        iterator(
            Some("g"),
            vec![stmt(method_call(ident("g"), "yield", vec![int(5)]))],
        ),
    ))];
    body.extend(sum_of_it());
    assert_eq!(run(&mut interp, body).unwrap(), Value::i32(5));
}

#[test]
fn loop_inside_generator() {
    let mut interp = interpreter();
    let mut body = vec![stmt(declare(
        "it",
        iterator(
            None,
            vec![
                stmt(declare("n", int(0))),
                while_loop(
                    bin(BinaryOp::Lt, ident("n"), int(4)),
                    vec![
                        stmt(compound(BinaryOp::Add, "n", int(1))),
                        yield_stmt(bin(BinaryOp::Mul, ident("n"), ident("n"))),
                    ],
                ),
            ],
        ),
    ))];
    body.extend(sum_of_it());
    assert_eq!(run(&mut interp, body).unwrap(), Value::i32(30));
}

#[test]
fn body_is_lazy() {
    let mut interp = interpreter();
    let body = vec![
        stmt(declare(
            "it",
            iterator(None, vec![print(string("started")), yield_stmt(int(1))]),
        )),
        print(string("created")),
        stmt(method_call(ident("it"), "next", vec![])),
    ];
    assert_eq!(run(&mut interp, body).unwrap(), Value::i32(1));
    assert_eq!(interp.print_handler().lines(), vec!["created", "started"]);
}

#[test]
fn exhausted_iterator_keeps_ending() {
    let mut interp = interpreter();
    let body = vec![
        stmt(declare("it", iterator(None, vec![yield_stmt(int(1))]))),
        stmt(method_call(ident("it"), "next", vec![])),
        stmt(method_call(ident("it"), "next", vec![])),
        stmt(method_call(ident("it"), "next", vec![])),
    ];
    assert_eq!(run(&mut interp, body).unwrap(), Value::IteratorEnd);
}

#[test]
fn break_closes_and_runs_ensure() {
    let mut interp = interpreter();
    let body = vec![
        stmt(declare(
            "it",
            iterator(
                None,
                vec![stmt(ensure(
                    block(vec![
                        print(string("a")),
                        yield_stmt(int(1)),
                        print(string("b")),
                        yield_stmt(int(2)),
                    ]),
                    vec![print(string("cleanup"))],
                ))],
            ),
        )),
        for_in(
            p_ident("x"),
            ident("it"),
            vec![print(ident("x")), brk(None, None)],
        ),
        print(string("after")),
    ];
    run(&mut interp, body).unwrap();
    assert_eq!(
        interp.print_handler().lines(),
        vec!["a", "1", "cleanup", "after"]
    );
}

#[test]
fn explicit_close_ends_the_sequence() {
    let mut interp = interpreter();
    let body = vec![
        stmt(declare(
            "it",
            iterator(None, vec![yield_stmt(int(1)), yield_stmt(int(2))]),
        )),
        stmt(method_call(ident("it"), "next", vec![])),
        stmt(method_call(ident("it"), "close", vec![])),
        stmt(method_call(ident("it"), "next", vec![])),
    ];
    assert_eq!(run(&mut interp, body).unwrap(), Value::IteratorEnd);
}

#[test]
fn errors_in_the_body_reach_the_consumer() {
    let mut interp = interpreter();
    let body = vec![
        stmt(declare(
            "it",
            iterator(
                None,
                vec![yield_stmt(int(1)), stmt(ident("missing"))],
            ),
        )),
        stmt(method_call(ident("it"), "next", vec![])),
        stmt(method_call(ident("it"), "next", vec![])),
    ];
    let err = run(&mut interp, body).unwrap_err();
    assert_eq!(err.message, "Undefined variable 'missing'");
}

#[test]
fn yield_outside_an_iterator_literal() {
    let mut interp = interpreter();
    let err = run(&mut interp, vec![yield_stmt(int(1))]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::YieldOutsideIterator);
    assert_eq!(err.message, "yield may only appear inside iterator literal");
}

#[test]
fn arrays_and_generators_share_the_for_protocol() {
    let mut interp = interpreter();
    let mut body = vec![stmt(declare(
        "it",
        array(vec![int(4), int(5), int(6)]),
    ))];
    body.extend(sum_of_it());
    assert_eq!(run(&mut interp, body).unwrap(), Value::i32(15));
}
