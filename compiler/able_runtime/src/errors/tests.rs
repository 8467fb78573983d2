use super::*;
use pretty_assertions::assert_eq;

// Kind → message

#[test]
fn division_by_zero_has_correct_kind() {
    let err = division_by_zero();
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    assert_eq!(err.message, "division by zero");
    assert!(err.signal.is_none());
}

#[test]
fn arithmetic_messages() {
    assert_eq!(integer_overflow().message, "integer overflow");
    assert_eq!(shift_out_of_range().message, "shift out of range");
    assert_eq!(
        bitwise_requires_i32().message,
        "Bitwise requires i32 operands"
    );
    assert_eq!(
        arithmetic_requires_numeric().message,
        "Arithmetic requires numeric operands"
    );
    assert_eq!(
        integer_width_exceeded().message,
        "integer operands exceed supported widths"
    );
}

#[test]
fn undefined_variable_has_correct_kind() {
    let err = undefined_variable("x");
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedVariable {
            name: "x".to_string()
        }
    );
    assert_eq!(err.message, "Undefined variable 'x'");
}

#[test]
fn arity_mismatch_message() {
    let err = arity_mismatch("add", 2, 3);
    assert_eq!(err.message, "Arity mismatch calling add: expected 2, got 3");
}

#[test]
fn ambiguous_method_lists_candidates() {
    let err = ambiguous_method(
        "show",
        "Wrapper",
        &["impl Show for Wrapper<T>".to_string(), "impl Show for Wrapper<U>".to_string()],
    );
    assert_eq!(
        err.message,
        "Ambiguous method 'show' for Wrapper: impl Show for Wrapper<T>, impl Show for Wrapper<U>"
    );
}

#[test]
fn constraint_violation_names_missing_method() {
    let err = constraint_violation("Point", "Show", "show");
    assert_eq!(
        err.message,
        "Type 'Point' does not satisfy interface 'Show': missing method 'show'"
    );
}

#[test]
fn label_messages() {
    assert_eq!(unknown_break_label("outer").message, "Unknown break label 'outer'");
    assert_eq!(
        unknown_continue_label("outer").message,
        "Unknown continue label 'outer'"
    );
    assert_eq!(break_outside_loop().message, "break outside loop");
    assert_eq!(return_outside_function().message, "return outside function");
    assert_eq!(rethrow_outside_rescue().message, "rethrow outside rescue");
}

#[test]
fn concurrency_messages() {
    assert_eq!(
        outside_async_task("proc_yield").message,
        "proc_yield must be called inside an asynchronous task"
    );
    assert_eq!(channel_error("send on closed channel").message, "send on closed channel");
    assert_eq!(deadlock().message, "deadlock: all tasks are blocked");
}

// Signals

#[test]
fn return_is_control_flow_not_raise() {
    let err = EvalError::return_with(Value::i32(1));
    assert!(err.is_control_flow());
    assert!(!err.is_raise());
    assert!(matches!(err.signal, Some(Signal::Return(Value::Integer(_)))));
}

#[test]
fn break_carries_label_and_value() {
    let err = EvalError::break_with(Some(Name::new("outer")), Value::string("done"));
    match err.signal {
        Some(Signal::Break { label, value }) => {
            assert_eq!(label, Some(Name::new("outer")));
            assert_eq!(value, Value::string("done"));
        }
        other => panic!("expected break, got {other:?}"),
    }
}

#[test]
fn raise_uses_error_message() {
    let err = EvalError::raise(Value::error("boom"));
    assert!(err.is_raise());
    assert!(!err.is_control_flow());
    assert_eq!(err.kind, EvalErrorKind::Raised);
    assert_eq!(err.message, "boom");
    assert_eq!(err.raised_value(), Some(&Value::error("boom")));
}

#[test]
fn with_span_keeps_innermost() {
    let err = division_by_zero()
        .with_span(Span::new(1, 2))
        .with_span(Span::new(0, 10));
    assert_eq!(err.span, Some(Span::new(1, 2)));
    assert_eq!(err.to_string(), "division by zero at 1..2");
}

#[test]
fn notes_accumulate() {
    let err = EvalError::new("bad").with_note(EvalNote::new("while calling f"));
    assert_eq!(err.notes.len(), 1);
    assert_eq!(err.notes[0].message, "while calling f");
}
