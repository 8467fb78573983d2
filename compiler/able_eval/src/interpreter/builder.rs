//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::sync::Arc;

use able_diagnostic::DiagnosticPolicy;
use able_runtime::{Environment, RuntimeData};
use parking_lot::RwLock;

use super::{CallFrame, EvalState, Interpreter, PackageRegistry, SharedState};
use crate::builtins::{self, BuiltinStructs};
use crate::concurrency::{Executor, ExecutorKind};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::resolver::TypeRegistry;
use crate::DEFAULT_WORKER_STACK;

/// Builder for creating Interpreter instances with various configurations.
///
/// Defaults: serial executor, stdout printing, 16 MiB worker stacks,
/// builtins installed, advisory diagnostics.
pub struct InterpreterBuilder {
    executor_kind: ExecutorKind,
    executor: Option<Arc<dyn Executor>>,
    print_handler: Option<SharedPrintHandler>,
    stack_size: usize,
    install_builtins: bool,
    diagnostic_policy: DiagnosticPolicy,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            executor_kind: ExecutorKind::default(),
            executor: None,
            print_handler: None,
            stack_size: DEFAULT_WORKER_STACK,
            install_builtins: true,
            diagnostic_policy: DiagnosticPolicy::default(),
        }
    }

    /// Choose one of the built-in executors.
    #[must_use]
    pub fn executor_kind(mut self, kind: ExecutorKind) -> Self {
        self.executor_kind = kind;
        self
    }

    /// Use an embedder-provided executor. Overrides `executor_kind`.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set where `print` writes. Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Stack size of task and generator worker threads.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Whether to define `print`, the proc primitives, channels, mutexes,
    /// and the builtin status structs in the global scope.
    ///
    /// Inherent methods of arrays, strings, iterators, and task handles are
    /// always registered.
    #[must_use]
    pub fn builtins(mut self, install: bool) -> Self {
        self.install_builtins = install;
        self
    }

    /// How diagnostics passed to `eval_module_with_diagnostics` are treated.
    #[must_use]
    pub fn diagnostic_policy(mut self, policy: DiagnosticPolicy) -> Self {
        self.diagnostic_policy = policy;
        self
    }

    /// Build the interpreter.
    pub fn build(self) -> Interpreter {
        let executor = self
            .executor
            .unwrap_or_else(|| self.executor_kind.create(self.stack_size));
        tracing::debug!(
            executor = executor.name(),
            stack_size = self.stack_size,
            builtins = self.install_builtins,
            "interpreter created"
        );
        let no_task: RuntimeData = Arc::new(());
        let shared = Arc::new(SharedState {
            globals: Environment::new(),
            registry: RwLock::new(TypeRegistry::new()),
            packages: RwLock::new(PackageRegistry::default()),
            builtin_structs: Arc::new(BuiltinStructs::new()),
            executor,
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            stack_size: self.stack_size,
            diagnostic_policy: self.diagnostic_policy,
            no_task,
        });
        shared.globals.set_runtime_data(Arc::clone(&shared.no_task));

        let interpreter = Interpreter {
            env: shared.globals.clone(),
            shared,
            frame: CallFrame::default(),
            state: EvalState::default(),
        };
        builtins::install_methods(&interpreter);
        if self.install_builtins {
            builtins::install_globals(&interpreter);
        }
        interpreter
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
