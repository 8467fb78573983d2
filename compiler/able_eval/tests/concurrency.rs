//! `proc`, `spawn`, channels, and mutexes driven from Able programs.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use able_eval::{buffer_handler, EvalErrorKind, ExecutorKind, Interpreter, Value};
use able_ir::ast::build::{
    bin, block, brk, call_named, compound, declare, for_in, if_expr, ident, int, loop_expr,
    method_call, member, nil, p_ident, proc_expr, raise, range, spawn, stmt, string,
};
use able_ir::ast::{BinaryOp, Expr, Module, Stmt};
use pretty_assertions::assert_eq;

fn interpreter(kind: ExecutorKind) -> Interpreter {
    Interpreter::builder()
        .executor_kind(kind)
        .print_handler(buffer_handler())
        .build()
}

fn run(interp: &mut Interpreter, body: Vec<Stmt>) -> Result<Value, able_eval::EvalError> {
    interp.eval_module(&Module::new(body))
}

fn print(value: Expr) -> Stmt {
    stmt(call_named("print", vec![value]))
}

fn builtin(name: &str, args: Vec<Expr>) -> Expr {
    call_named(name, args)
}

fn struct_name(value: &Value) -> String {
    match value {
        Value::Struct(instance) => instance.definition.name.as_str().to_string(),
        other => panic!("expected status struct, got {other:?}"),
    }
}

/// Sends 1..=4 from a proc and sums them on the host until the channel closes.
fn producer_consumer() -> Vec<Stmt> {
    vec![
        stmt(declare("ch", builtin("__able_channel_new", vec![int(0)]))),
        stmt(proc_expr(block(vec![
            for_in(
                p_ident("i"),
                range(int(1), int(4), true),
                vec![stmt(builtin(
                    "__able_channel_send",
                    vec![ident("ch"), ident("i")],
                ))],
            ),
            stmt(builtin("__able_channel_close", vec![ident("ch")])),
        ]))),
        stmt(declare("total", int(0))),
        stmt(loop_expr(vec![
            stmt(declare("v", builtin("__able_channel_receive", vec![ident("ch")]))),
            stmt(if_expr(
                bin(BinaryOp::Eq, ident("v"), nil()),
                vec![brk(None, None)],
                vec![],
            )),
            stmt(compound(BinaryOp::Add, "total", ident("v"))),
        ])),
        stmt(ident("total")),
    ]
}

mod tasks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn spawn_value() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare(
                "f",
                spawn(bin(BinaryOp::Add, int(20), int(22))),
            )),
            stmt(method_call(ident("f"), "value", vec![])),
        ];
        assert_eq!(run(&mut interp, body).unwrap(), Value::i32(42));
    }

    #[test]
    fn future_body_runs_once() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare("count", int(0))),
            stmt(declare(
                "f",
                spawn(block(vec![
                    stmt(compound(BinaryOp::Add, "count", int(1))),
                    stmt(ident("count")),
                ])),
            )),
            stmt(method_call(ident("f"), "value", vec![])),
            stmt(method_call(ident("f"), "value", vec![])),
            stmt(ident("count")),
        ];
        assert_eq!(run(&mut interp, body).unwrap(), Value::i32(1));
    }

    #[test]
    fn awaiting_inside_a_task() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare(
                "outer",
                spawn(block(vec![
                    stmt(declare("inner", spawn(int(20)))),
                    stmt(bin(
                        BinaryOp::Add,
                        method_call(ident("inner"), "value", vec![]),
                        int(1),
                    )),
                ])),
            )),
            stmt(method_call(ident("outer"), "value", vec![])),
        ];
        assert_eq!(run(&mut interp, body).unwrap(), Value::i32(21));
    }

    #[test]
    fn failed_proc_value_is_an_error() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare("p", proc_expr(block(vec![raise(string("boom"))])))),
            stmt(declare("result", method_call(ident("p"), "value", vec![]))),
            stmt(member(ident("result"), "message")),
        ];
        assert_eq!(
            run(&mut interp, body).unwrap(),
            Value::string("Proc failed: boom")
        );
        let status = run(
            &mut interp,
            vec![stmt(method_call(ident("p"), "status", vec![]))],
        )
        .unwrap();
        assert_eq!(struct_name(&status), "Failed");
    }

    #[test]
    fn cancel_before_start_skips_the_body() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare("p", proc_expr(block(vec![print(string("ran"))])))),
            stmt(method_call(ident("p"), "cancel", vec![])),
            stmt(builtin("proc_flush", vec![])),
            stmt(method_call(ident("p"), "status", vec![])),
        ];
        let status = run(&mut interp, body).unwrap();
        assert_eq!(struct_name(&status), "Cancelled");
        assert!(interp.print_handler().lines().is_empty());
    }

    #[test]
    fn status_moves_from_pending_to_resolved() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let pending = run(
            &mut interp,
            vec![
                stmt(declare("p", proc_expr(int(1)))),
                stmt(method_call(ident("p"), "status", vec![])),
            ],
        )
        .unwrap();
        assert_eq!(struct_name(&pending), "Pending");

        let resolved = run(
            &mut interp,
            vec![
                stmt(builtin("proc_flush", vec![])),
                stmt(method_call(ident("p"), "status", vec![])),
            ],
        )
        .unwrap();
        assert_eq!(struct_name(&resolved), "Resolved");
    }

    #[test]
    fn awaiting_a_blocked_task_deadlocks() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare("ch", builtin("__able_channel_new", vec![int(0)]))),
            stmt(declare(
                "p",
                proc_expr(builtin("__able_channel_receive", vec![ident("ch")])),
            )),
            stmt(method_call(ident("p"), "value", vec![])),
        ];
        let err = run(&mut interp, body).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::Deadlock);
        assert_eq!(err.message, "deadlock: all tasks are blocked");
    }
}

mod scheduling {
    use super::*;
    use pretty_assertions::assert_eq;

    fn worker(name: &str, locked: bool) -> Stmt {
        let mut body = Vec::new();
        if locked {
            body.push(stmt(builtin("__able_mutex_lock", vec![ident("m")])));
        }
        body.push(print(string(&format!("{name}1"))));
        body.push(stmt(builtin("proc_yield", vec![])));
        body.push(print(string(&format!("{name}2"))));
        if locked {
            body.push(stmt(builtin("__able_mutex_unlock", vec![ident("m")])));
        }
        stmt(proc_expr(block(body)))
    }

    #[test]
    fn yield_interleaves_procs() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            worker("a", false),
            worker("b", false),
            stmt(builtin("proc_flush", vec![])),
        ];
        run(&mut interp, body).unwrap();
        assert_eq!(interp.print_handler().lines(), vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn mutex_serializes_critical_sections() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare("m", builtin("__able_mutex_new", vec![]))),
            worker("a", true),
            worker("b", true),
            stmt(builtin("proc_flush", vec![])),
        ];
        run(&mut interp, body).unwrap();
        assert_eq!(interp.print_handler().lines(), vec!["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn pending_task_count() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(proc_expr(int(1))),
            stmt(proc_expr(int(2))),
            stmt(builtin("proc_pending_tasks", vec![])),
        ];
        assert_eq!(run(&mut interp, body).unwrap(), Value::i32(2));
        assert_eq!(interp.pending_tasks(), 2);
        interp.flush();
        assert_eq!(interp.pending_tasks(), 0);
    }

    #[test]
    fn proc_cancelled_inside_a_task() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare(
                "p",
                proc_expr(block(vec![stmt(builtin("proc_cancelled", vec![]))])),
            )),
            stmt(method_call(ident("p"), "value", vec![])),
        ];
        assert_eq!(run(&mut interp, body).unwrap(), Value::Bool(false));
    }
}

mod channels {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rendezvous_between_proc_and_host() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare("ch", builtin("__able_channel_new", vec![int(0)]))),
            stmt(proc_expr(builtin(
                "__able_channel_send",
                vec![ident("ch"), int(42)],
            ))),
            stmt(builtin("__able_channel_receive", vec![ident("ch")])),
        ];
        assert_eq!(run(&mut interp, body).unwrap(), Value::i32(42));
    }

    #[test]
    fn producer_consumer_serial() {
        let mut interp = interpreter(ExecutorKind::Serial);
        assert_eq!(run(&mut interp, producer_consumer()).unwrap(), Value::i32(10));
    }

    #[test]
    fn producer_consumer_concurrent() {
        let mut interp = interpreter(ExecutorKind::Concurrent);
        assert_eq!(run(&mut interp, producer_consumer()).unwrap(), Value::i32(10));
    }

    #[test]
    fn send_inside_task_blocks_until_received() {
        let mut interp = interpreter(ExecutorKind::Serial);
        let body = vec![
            stmt(declare("ch", builtin("__able_channel_new", vec![int(0)]))),
            stmt(proc_expr(block(vec![
                print(string("sending")),
                stmt(builtin("__able_channel_send", vec![ident("ch"), int(1)])),
                print(string("sent")),
            ]))),
            stmt(proc_expr(block(vec![
                print(string("receiving")),
                stmt(builtin("__able_channel_receive", vec![ident("ch")])),
            ]))),
            stmt(builtin("proc_flush", vec![])),
        ];
        run(&mut interp, body).unwrap();
        let lines = interp.print_handler().lines();
        assert_eq!(lines.first().map(String::as_str), Some("sending"));
        assert_eq!(lines.len(), 3);
        let sent = lines.iter().position(|l| l == "sent").unwrap();
        let receiving = lines.iter().position(|l| l == "receiving").unwrap();
        assert!(receiving < sent);
    }
}

#[test]
fn concurrent_futures_sum() {
    let mut interp = interpreter(ExecutorKind::Concurrent);
    let mut body = Vec::new();
    for n in 1..=3 {
        body.push(stmt(declare(
            &format!("f{n}"),
            spawn(bin(BinaryOp::Mul, int(n), int(10))),
        )));
    }
    body.push(stmt(bin(
        BinaryOp::Add,
        bin(
            BinaryOp::Add,
            method_call(ident("f1"), "value", vec![]),
            method_call(ident("f2"), "value", vec![]),
        ),
        method_call(ident("f3"), "value", vec![]),
    )));
    assert_eq!(run(&mut interp, body).unwrap(), Value::i32(60));
}
