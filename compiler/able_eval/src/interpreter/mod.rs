//! Tree-walking interpreter for Able.
//!
//! # Architecture
//!
//! An [`Interpreter`] is cheap to fork: the process-wide tables (types and
//! impls, packages, globals, the executor) live in [`SharedState`] behind
//! an `Arc`, and only the current scope and the per-task dynamic state are
//! owned. Every `proc`/`spawn` body and every iterator literal runs on a
//! fork of the interpreter that created it.
//!
//! Per-call state ([`CallFrame`]) is swapped in and out around function
//! bodies. Dynamic state ([`EvalState`]) is not: the breakpoint labels and
//! the raise stack stay visible across calls, so a labeled `break` inside
//! a callback reaches the breakpoint that encloses the call.
//!
//! Helper modules in `crate::exec` hold the pure pieces:
//!
//! - `exec::pattern` - destructuring and `match` patterns
//! - `exec::control` - which construct absorbs which signal
//! - `exec::expr` - literals, indexing, ranges, raise normalization
//! - `exec::placeholder` - partial application and placeholder lambdas

mod builder;
mod definitions;
mod eval;
mod function_call;
mod method_dispatch;
mod modules;
mod scope_guard;
mod structs;
mod tasks;

pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

use std::sync::Arc;

use able_ir::Name;
use able_runtime::{CallContext, Environment, EvalResult, RuntimeData, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builtins::BuiltinStructs;
use crate::concurrency::{AsyncContext, Executor};
use crate::exec::placeholder::PlaceholderFrame;
use crate::print_handler::SharedPrintHandler;
use crate::resolver::TypeRegistry;
use able_diagnostic::DiagnosticPolicy;
use able_runtime::value::GeneratorControl;

pub(crate) use modules::PackageRegistry;

/// Process-wide interpreter state, shared by every fork.
pub struct SharedState {
    pub(crate) globals: Environment,
    /// Filled while modules load. Readers drop the guard before calling
    /// back into the evaluator.
    pub(crate) registry: RwLock<TypeRegistry>,
    pub(crate) packages: RwLock<PackageRegistry>,
    pub(crate) builtin_structs: Arc<BuiltinStructs>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) print_handler: SharedPrintHandler,
    pub(crate) stack_size: usize,
    pub(crate) diagnostic_policy: DiagnosticPolicy,
    /// Runtime data stamped on scopes that run outside any task.
    pub(crate) no_task: RuntimeData,
}

/// State of the function call being evaluated.
#[derive(Clone, Default)]
pub(crate) struct CallFrame {
    /// Implicit receiver for `#member`: the first argument of the call.
    pub receiver: Option<Value>,
    /// Package the running function was defined in.
    pub package: Option<Name>,
    /// Arguments of a running placeholder lambda.
    pub placeholder: Option<PlaceholderFrame>,
}

/// Dynamic state of one thread of evaluation.
#[derive(Default)]
pub(crate) struct EvalState {
    /// Labels of the breakpoints being evaluated, innermost last.
    pub breakpoints: Vec<Name>,
    /// Raised values of the rescue clauses being evaluated, innermost last.
    pub raise_stack: Vec<Value>,
    /// The task this evaluation runs in.
    pub task: Option<Arc<AsyncContext>>,
    /// Controller of the iterator literal whose body this evaluation runs.
    pub generator: Option<Arc<dyn GeneratorControl>>,
}

/// Tree-walking interpreter.
pub struct Interpreter {
    /// Current scope.
    pub env: Environment,
    pub(crate) shared: Arc<SharedState>,
    pub(crate) frame: CallFrame,
    pub(crate) state: EvalState,
}

impl Interpreter {
    /// An interpreter with the default configuration: serial executor,
    /// stdout printing, builtins installed.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// A new evaluation thread over the same shared state, starting in
    /// `env`.
    ///
    /// The fork keeps the package and receiver of the current call but no
    /// breakpoints, rescue context, task, or generator.
    pub(crate) fn fork(&self, env: Environment) -> Interpreter {
        Interpreter {
            env,
            shared: Arc::clone(&self.shared),
            frame: CallFrame {
                receiver: self.frame.receiver.clone(),
                package: self.frame.package.clone(),
                placeholder: None,
            },
            state: EvalState::default(),
        }
    }

    /// The global scope.
    pub fn globals(&self) -> &Environment {
        &self.shared.globals
    }

    /// Look up a binding from the current scope outward.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.env.lookup(name)
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.shared.print_handler
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.shared.executor
    }

    /// Run scheduled tasks until each has finished or is blocked.
    pub fn flush(&self) {
        self.shared.executor.flush();
    }

    /// Tasks scheduled but not yet finished.
    pub fn pending_tasks(&self) -> usize {
        self.shared.executor.pending_tasks()
    }

    /// Runtime data for scopes created by this evaluation: the task context
    /// inside a task, a marker elsewhere.
    pub(crate) fn runtime_data(&self) -> RuntimeData {
        match &self.state.task {
            Some(task) => Arc::clone(task) as RuntimeData,
            None => Arc::clone(&self.shared.no_task),
        }
    }

    /// Symbols currently exported by `package`.
    pub fn package_symbols(&self, package: &str) -> Option<FxHashMap<Name, Value>> {
        self.shared
            .packages
            .read()
            .get(package)
            .map(|entry| entry.public.clone())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext for Interpreter {
    fn env(&self) -> &Environment {
        &self.env
    }

    fn call(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        self.call_value(callee, args)
    }

    fn call_method(&mut self, receiver: &Value, method: &str, args: Vec<Value>) -> EvalResult {
        self.invoke_method(receiver, method, args)
    }
}
