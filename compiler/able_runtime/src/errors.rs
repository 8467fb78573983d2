//! Evaluation errors and control-flow signals.
//!
//! Return, break, continue, and raise travel through the same `Err` channel
//! as genuine failures so that `?` unwinds them through every evaluator
//! frame. Each carries a [`Signal`]; only the construct designed to absorb a
//! particular signal may inspect and consume it.
//!
//! Factory functions (`division_by_zero()`, `ambiguous_method(..)`, ...)
//! populate both `kind` and `message`.

use std::fmt;

use able_ir::{Name, Span};

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Non-local control transfer carried by an [`EvalError`].
#[derive(Clone, Debug)]
pub enum Signal {
    /// Caught at the function/lambda call boundary.
    Return(Value),
    /// Caught by the innermost loop, or by the breakpoint named `label`.
    Break { label: Option<Name>, value: Value },
    /// Caught by the innermost loop, or by the breakpoint named `label`.
    Continue { label: Option<Name> },
    /// A user-raised error value; the only signal `rescue`, `or`, and `?` see.
    Raise(Value),
}

/// Typed error category.
///
/// The `Display` impl produces the user-visible message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Arithmetic
    DivisionByZero,
    IntegerOverflow,
    IntegerWidthExceeded,
    ArithmeticRequiresNumeric,
    BitwiseRequiresI32,
    ShiftOutOfRange,

    // Operators
    LogicalRequiresBool {
        op: String,
    },
    UnaryTypeMismatch {
        op: String,
        type_name: String,
    },
    IncomparableValues {
        left: String,
        right: String,
    },
    TypeMismatch {
        expected: String,
        got: String,
    },

    // Access
    UndefinedVariable {
        name: String,
    },
    NoFieldOrMethod {
        member: String,
        type_name: String,
    },
    NoMethod {
        method: String,
        type_name: String,
    },
    NoStaticMethod {
        method: String,
        type_name: String,
    },
    PrivateMethod {
        method: String,
        type_name: String,
    },
    AmbiguousMethod {
        method: String,
        type_name: String,
        candidates: String,
    },
    IndexOutOfBounds {
        index: i128,
        len: usize,
    },

    // Calls
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    TypeArgumentCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    ConstraintViolation {
        type_name: String,
        interface: String,
        method: String,
    },
    NotCallable {
        type_name: String,
    },

    // Patterns
    NonExhaustiveMatch,
    PatternMismatch {
        reason: String,
    },

    // Control flow
    ControlFlow,
    Raised,
    UnknownLabel {
        keyword: &'static str,
        label: String,
    },
    OutsideConstruct {
        what: &'static str,
    },

    // Definitions
    UndefinedInterface {
        name: String,
    },
    DuplicateImpl {
        interface: String,
        target: String,
    },

    // Generators
    YieldOutsideIterator,
    YieldAfterClose,
    IteratorReentered,
    GeneratorClosed,

    // Concurrency
    OutsideAsyncTask {
        primitive: String,
    },
    TaskCancelled,
    Deadlock,
    ChannelError {
        message: &'static str,
    },

    /// Catch-all for failures without a structured kind.
    Custom {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Arithmetic
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::IntegerWidthExceeded => write!(f, "integer operands exceed supported widths"),
            Self::ArithmeticRequiresNumeric => write!(f, "Arithmetic requires numeric operands"),
            Self::BitwiseRequiresI32 => write!(f, "Bitwise requires i32 operands"),
            Self::ShiftOutOfRange => write!(f, "shift out of range"),

            // Operators
            Self::LogicalRequiresBool { op } => {
                write!(f, "Logical operator {op} requires boolean operands")
            }
            Self::UnaryTypeMismatch { op, type_name } => {
                write!(f, "Unary '{op}' not supported for {type_name}")
            }
            Self::IncomparableValues { left, right } => {
                write!(f, "Cannot compare {left} with {right}")
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {expected}, got {got}")
            }

            // Access
            Self::UndefinedVariable { name } => write!(f, "Undefined variable '{name}'"),
            Self::NoFieldOrMethod { member, type_name } => {
                write!(f, "No field or method named '{member}' on {type_name}")
            }
            Self::NoMethod { method, type_name } => {
                write!(f, "No method '{method}' for {type_name}")
            }
            Self::NoStaticMethod { method, type_name } => {
                write!(f, "No static method '{method}' for {type_name}")
            }
            Self::PrivateMethod { method, type_name } => {
                write!(f, "Method '{method}' on {type_name} is private")
            }
            Self::AmbiguousMethod {
                method,
                type_name,
                candidates,
            } => write!(f, "Ambiguous method '{method}' for {type_name}: {candidates}"),
            Self::IndexOutOfBounds { .. } => write!(f, "Array index out of bounds"),

            // Calls
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => write!(f, "Arity mismatch calling {name}: expected {expected}, got {got}"),
            Self::TypeArgumentCountMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "Type arguments count mismatch calling {name}: expected {expected}, got {got}"
            ),
            Self::ConstraintViolation {
                type_name,
                interface,
                method,
            } => write!(
                f,
                "Type '{type_name}' does not satisfy interface '{interface}': missing method '{method}'"
            ),
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),

            // Patterns
            Self::NonExhaustiveMatch => write!(f, "Non-exhaustive match"),
            Self::PatternMismatch { reason } => write!(f, "{reason}"),

            // Control flow
            Self::ControlFlow => write!(f, "control flow signal"),
            Self::Raised => write!(f, "raised error"),
            Self::UnknownLabel { keyword, label } => write!(f, "Unknown {keyword} label '{label}'"),
            Self::OutsideConstruct { what } => write!(f, "{what}"),

            // Definitions
            Self::UndefinedInterface { name } => write!(f, "Interface '{name}' is not defined"),
            Self::DuplicateImpl { interface, target } => {
                write!(f, "Unnamed impl for ({interface}, {target}) already exists")
            }

            // Generators
            Self::YieldOutsideIterator => {
                write!(f, "yield may only appear inside iterator literal")
            }
            Self::YieldAfterClose => write!(f, "Cannot yield from a closed iterator"),
            Self::IteratorReentered => {
                write!(f, "iterator.next re-entered while suspended at yield")
            }
            Self::GeneratorClosed => write!(f, "iterator closed"),

            // Concurrency
            Self::OutsideAsyncTask { primitive } => {
                write!(f, "{primitive} must be called inside an asynchronous task")
            }
            Self::TaskCancelled => write!(f, "task cancelled"),
            Self::Deadlock => write!(f, "deadlock: all tasks are blocked"),
            Self::ChannelError { message } => write!(f, "{message}"),

            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Additional context note attached to an error.
#[derive(Clone, Debug)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }
}

/// Evaluation error or control-flow signal.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors
    /// and the error value's message for raises.
    pub message: String,
    /// Set for return/break/continue/raise.
    pub signal: Option<Signal>,
    /// Source location where the error occurred.
    pub span: Option<Span>,
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            signal: None,
            span: None,
            notes: Vec::new(),
        }
    }

    fn signal(kind: EvalErrorKind, message: String, signal: Signal) -> Self {
        Self {
            kind,
            message,
            signal: Some(signal),
            span: None,
            notes: Vec::new(),
        }
    }

    /// `return value`
    pub fn return_with(value: Value) -> Self {
        Self::signal(
            EvalErrorKind::ControlFlow,
            "return".to_string(),
            Signal::Return(value),
        )
    }

    /// `break 'label value`
    pub fn break_with(label: Option<Name>, value: Value) -> Self {
        let message = match &label {
            Some(label) => format!("break '{label}"),
            None => "break".to_string(),
        };
        Self::signal(
            EvalErrorKind::ControlFlow,
            message,
            Signal::Break { label, value },
        )
    }

    /// `continue 'label`
    pub fn continue_signal(label: Option<Name>) -> Self {
        let message = match &label {
            Some(label) => format!("continue '{label}"),
            None => "continue".to_string(),
        };
        Self::signal(
            EvalErrorKind::ControlFlow,
            message,
            Signal::Continue { label },
        )
    }

    /// Raise an already-normalized error value.
    ///
    /// The message mirrors the value's message so an unrescued raise reads
    /// naturally when reported at the top of a module.
    pub fn raise(value: Value) -> Self {
        let message = match &value {
            Value::Error(err) => err.message.clone(),
            other => other.to_string(),
        };
        Self::signal(EvalErrorKind::Raised, message, Signal::Raise(value))
    }

    /// Attach a source span, keeping the innermost one.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    /// Check if this error is a return/break/continue signal.
    #[inline]
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self.signal,
            Some(Signal::Return(_) | Signal::Break { .. } | Signal::Continue { .. })
        )
    }

    /// The raised value, if this is a raise signal.
    pub fn raised_value(&self) -> Option<&Value> {
        match &self.signal {
            Some(Signal::Raise(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn is_raise(&self) -> bool {
        self.raised_value().is_some()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Arithmetic

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow() -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow)
}

#[cold]
pub fn integer_width_exceeded() -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerWidthExceeded)
}

#[cold]
pub fn arithmetic_requires_numeric() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArithmeticRequiresNumeric)
}

#[cold]
pub fn bitwise_requires_i32() -> EvalError {
    EvalError::from_kind(EvalErrorKind::BitwiseRequiresI32)
}

#[cold]
pub fn shift_out_of_range() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ShiftOutOfRange)
}

// Operators

#[cold]
pub fn logical_requires_bool(op: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::LogicalRequiresBool { op: op.to_string() })
}

#[cold]
pub fn unary_type_mismatch(op: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnaryTypeMismatch {
        op: op.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn incomparable_values(left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IncomparableValues {
        left: left.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

// Access

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn no_field_or_method(member: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoFieldOrMethod {
        member: member.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn no_method(method: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn no_static_method(method: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoStaticMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn private_method(method: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::PrivateMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn ambiguous_method(method: &str, type_name: &str, candidates: &[String]) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AmbiguousMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
        candidates: candidates.join(", "),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i128, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, len })
}

// Calls

#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn type_argument_count_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeArgumentCountMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn constraint_violation(type_name: &str, interface: &str, method: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstraintViolation {
        type_name: type_name.to_string(),
        interface: interface.to_string(),
        method: method.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

// Patterns

#[cold]
pub fn non_exhaustive_match() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonExhaustiveMatch)
}

#[cold]
pub fn pattern_mismatch(reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::PatternMismatch {
        reason: reason.into(),
    })
}

// Control flow

#[cold]
pub fn unknown_break_label(label: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownLabel {
        keyword: "break",
        label: label.to_string(),
    })
}

#[cold]
pub fn unknown_continue_label(label: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownLabel {
        keyword: "continue",
        label: label.to_string(),
    })
}

#[cold]
pub fn break_outside_loop() -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideConstruct {
        what: "break outside loop",
    })
}

#[cold]
pub fn continue_outside_loop() -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideConstruct {
        what: "continue outside loop",
    })
}

#[cold]
pub fn return_outside_function() -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideConstruct {
        what: "return outside function",
    })
}

#[cold]
pub fn rethrow_outside_rescue() -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideConstruct {
        what: "rethrow outside rescue",
    })
}

#[cold]
pub fn placeholder_outside_lambda() -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideConstruct {
        what: "Expression placeholder used outside of placeholder lambda",
    })
}

#[cold]
pub fn implicit_member_outside_method() -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideConstruct {
        what: "Implicit member access requires a method receiver",
    })
}

#[cold]
pub fn breakpoint_requires_label() -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideConstruct {
        what: "Breakpoint expression requires label",
    })
}

// Definitions

#[cold]
pub fn undefined_interface(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedInterface {
        name: name.to_string(),
    })
}

#[cold]
pub fn duplicate_impl(interface: &str, target: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DuplicateImpl {
        interface: interface.to_string(),
        target: target.to_string(),
    })
}

// Generators

#[cold]
pub fn yield_outside_iterator() -> EvalError {
    EvalError::from_kind(EvalErrorKind::YieldOutsideIterator)
}

#[cold]
pub fn yield_after_close() -> EvalError {
    EvalError::from_kind(EvalErrorKind::YieldAfterClose)
}

#[cold]
pub fn iterator_reentered() -> EvalError {
    EvalError::from_kind(EvalErrorKind::IteratorReentered)
}

#[cold]
pub fn generator_closed() -> EvalError {
    EvalError::from_kind(EvalErrorKind::GeneratorClosed)
}

// Concurrency

#[cold]
pub fn outside_async_task(primitive: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutsideAsyncTask {
        primitive: primitive.to_string(),
    })
}

#[cold]
pub fn task_cancelled() -> EvalError {
    EvalError::from_kind(EvalErrorKind::TaskCancelled)
}

#[cold]
pub fn deadlock() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Deadlock)
}

#[cold]
pub fn channel_error(message: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ChannelError { message })
}

#[cfg(test)]
mod tests;
