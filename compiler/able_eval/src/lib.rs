//! Able Eval - tree-walking evaluator for the Able language.
//!
//! The interpreter consumes an `able_ir` syntax tree and produces runtime
//! values from `able_runtime`.
//!
//! # Architecture
//!
//! - [`Interpreter`]: expression and statement dispatch, calls, member
//!   access, module and package handling
//! - [`resolver`]: inherent-first method lookup and impl specificity
//! - [`concurrency`]: the [`Executor`] behind `proc` and `spawn`, with a
//!   deterministic serial scheduler and a thread-per-task one
//! - [`generator`]: iterator literals driven on worker threads
//! - [`exec`]: pattern matching, control-flow signal routing, and
//!   placeholder lambdas
//! - `builtins`: `print`, the proc primitives, channels, mutexes, and the
//!   inherent natives of arrays, strings, iterators, and task handles
//!
//! # Logging
//!
//! Call [`init_tracing`] once at startup. With `RUST_LOG` unset it does
//! nothing; with `ABLE_LOG_TREE` set spans print as an indented tree.

mod builtins;
pub mod concurrency;
pub mod exec;
pub mod generator;
pub mod interpreter;
mod operators;
mod print_handler;
pub mod resolver;
mod unary_operators;

use std::sync::Once;

pub use able_diagnostic::{Diagnostic, DiagnosticPolicy};
pub use able_runtime::{EvalError, EvalErrorKind, EvalResult, Value};
pub use concurrency::{
    AsyncContext, ConcurrentExecutor, Executor, ExecutorKind, SerialExecutor, TaskBody,
};
pub use interpreter::{Interpreter, InterpreterBuilder, ScopedInterpreter};
pub use operators::{evaluate_binary, three_way};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use unary_operators::evaluate_unary;

/// Default stack size for task and generator worker threads.
pub const DEFAULT_WORKER_STACK: usize = 16 * 1024 * 1024;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=able_eval=debug`; set `ABLE_LOG_TREE` as well for
/// indented span output.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let installed = if std::env::var_os("ABLE_LOG_TREE").is_some() {
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init()
        };
        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}
