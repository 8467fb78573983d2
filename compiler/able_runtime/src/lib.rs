//! Able runtime - values and primitives shared by the evaluator.
//!
//! # Layout
//!
//! - [`value`]: the closed `Value` enum and its payloads
//! - [`errors`]: `EvalError`, control-flow [`Signal`]s, and error factories
//! - [`environment`]: the lexical scope chain
//! - [`proc`]: one-shot task handles behind `proc` and `spawn`
//! - [`sync`]: non-blocking channel and mutex cores
//! - [`iterator`]: iterator sources over arrays, ranges, and strings
//! - [`call`]: the calling convention for native functions

pub mod call;
pub mod environment;
pub mod errors;
pub mod iterator;
pub mod proc;
pub mod sync;
pub mod value;

pub use call::CallContext;
pub use environment::{EnvError, Environment, RuntimeData};
pub use errors::{EvalError, EvalErrorKind, EvalNote, EvalResult, Signal};
pub use iterator::{IteratorRef, IteratorSource};
pub use proc::{TaskHandle, TaskKind, TaskStatus};
pub use sync::{Channel, MutexHandle, Notifier, ReceiveOutcome};
pub use value::Value;
