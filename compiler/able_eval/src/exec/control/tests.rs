use able_ir::Name;
use able_runtime::{EvalError, Value};
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn unlabeled_break_exits_loop_with_value() {
    let action = loop_action(Err(EvalError::break_with(None, Value::i32(3))));
    assert!(matches!(action, LoopAction::Exit(v) if v == Value::i32(3)));
    assert!(matches!(
        loop_action(Err(EvalError::continue_signal(None))),
        LoopAction::Next
    ));
}

#[test]
fn labeled_signals_pass_through_loops() {
    let label = Some(Name::new("outer"));
    let action = loop_action(Err(EvalError::break_with(label, Value::Nil)));
    assert!(matches!(action, LoopAction::Propagate(_)));
}

#[test]
fn breakpoint_catches_only_its_label() {
    let outer = Name::new("outer");
    let inner = Name::new("inner");
    let hit = breakpoint_action(
        &outer,
        Err(EvalError::break_with(Some(outer.clone()), Value::string("done"))),
    );
    assert!(matches!(hit, BreakpointAction::Done(v) if v == Value::string("done")));

    let rerun = breakpoint_action(&outer, Err(EvalError::continue_signal(Some(outer.clone()))));
    assert!(matches!(rerun, BreakpointAction::Rerun));

    let miss = breakpoint_action(&outer, Err(EvalError::break_with(Some(inner), Value::Nil)));
    assert!(matches!(miss, BreakpointAction::Propagate(_)));
}

#[test]
fn function_boundary_catches_return() {
    let value = function_result(Err(EvalError::return_with(Value::i32(1)))).unwrap();
    assert_eq!(value, Value::i32(1));

    let err = function_result(Err(EvalError::break_with(None, Value::Nil))).unwrap_err();
    assert_eq!(err.message, "break outside loop");

    let labeled = Some(Name::new("outer"));
    let err = function_result(Err(EvalError::break_with(labeled, Value::Nil))).unwrap_err();
    assert!(err.is_control_flow());
}

#[test]
fn top_level_reports_escaped_signals() {
    let err = top_level_result(Err(EvalError::return_with(Value::Nil))).unwrap_err();
    assert_eq!(err.message, "return outside function");
    let err = top_level_result(Err(EvalError::continue_signal(None))).unwrap_err();
    assert_eq!(err.message, "continue outside loop");

    let raised = top_level_result(Err(EvalError::raise(Value::error("boom")))).unwrap_err();
    assert!(raised.is_raise());
    assert_eq!(raised.message, "boom");
}
