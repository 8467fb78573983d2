//! Scheduling of `proc` and `spawn` task bodies.
//!
//! An [`Executor`] owns task threads and decides when they run. Two are
//! provided:
//!
//! - [`SerialExecutor`]: exactly one task body runs at a time, in FIFO
//!   order, and only while the host drives it. Interleaving is fully
//!   deterministic.
//! - [`ConcurrentExecutor`]: every task runs on its own OS thread.
//!
//! Blocking operations (awaiting a handle, channel send/receive, mutex
//! lock) never block directly. They hand a non-blocking `attempt` to
//! [`Executor::block_on`], which retries it at the executor's own pace.

mod concurrent;
mod serial;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use able_runtime::{
    EvalError, EvalErrorKind, EvalResult, Notifier, RuntimeData, TaskHandle, TaskKind, Value,
};

pub use concurrent::ConcurrentExecutor;
pub use serial::SerialExecutor;

/// Body of a task; receives the context of the task running it.
pub type TaskBody = Box<dyn FnOnce(AsyncContext) -> EvalResult + Send>;

/// What a running task knows about itself.
///
/// Travels to natives through the call environment's runtime data slot.
#[derive(Clone, Debug)]
pub struct AsyncContext {
    handle: TaskHandle,
}

impl AsyncContext {
    pub fn new(handle: TaskHandle) -> Self {
        AsyncContext { handle }
    }

    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.cancel_requested()
    }

    /// Recover the context from an environment's runtime data.
    pub fn from_runtime_data(data: Option<RuntimeData>) -> Option<Arc<AsyncContext>> {
        data.and_then(|data| data.downcast::<AsyncContext>().ok())
    }
}

/// Pluggable scheduling strategy.
pub trait Executor: Send + Sync {
    /// Schedule a task body and return its handle immediately.
    fn spawn(&self, kind: TaskKind, body: TaskBody) -> TaskHandle;

    /// Run pending work until every task is finished or blocked.
    fn flush(&self);

    /// Tasks scheduled but not yet finished.
    fn pending_tasks(&self) -> usize;

    /// Cooperative yield from inside a task. Outside a task this is a
    /// no-op.
    fn yield_now(&self, current: Option<&AsyncContext>);

    /// Retry `attempt` until it produces a value.
    ///
    /// `wake` is signalled whenever retrying might succeed. Inside a task,
    /// a cancellation request ends the wait with `task cancelled`.
    fn block_on(
        &self,
        current: Option<&AsyncContext>,
        wake: Option<&Notifier>,
        attempt: &mut dyn FnMut() -> Result<Option<Value>, EvalError>,
    ) -> EvalResult;

    fn name(&self) -> &'static str;

    fn run_proc(&self, body: TaskBody) -> TaskHandle {
        self.spawn(TaskKind::Proc, body)
    }

    fn run_future(&self, body: TaskBody) -> TaskHandle {
        self.spawn(TaskKind::Future, body)
    }
}

/// Wait for a handle to reach a terminal state and return its outcome.
pub fn await_handle(
    executor: &dyn Executor,
    current: Option<&AsyncContext>,
    handle: &TaskHandle,
) -> EvalResult {
    executor.block_on(current, None, &mut || Ok(handle.status().outcome()))
}

/// Run a task body to completion and record its outcome on `handle`.
///
/// A handle already terminal, or one whose start was claimed by a cancel,
/// skips the body.
/// Panics are recovered and recorded as failures.
pub(crate) fn run_task_body(handle: &TaskHandle, body: TaskBody) {
    if handle.is_ready() || !handle.mark_started() {
        return;
    }
    if handle.cancel_requested() {
        handle.cancel();
        return;
    }
    tracing::trace!(task = handle.id(), kind = ?handle.kind(), "task started");

    let context = AsyncContext::new(handle.clone());
    match catch_unwind(AssertUnwindSafe(|| body(context))) {
        Ok(Ok(value)) => {
            if handle.cancel_requested() {
                handle.cancel();
            } else {
                handle.resolve(value);
            }
        }
        Ok(Err(err)) if err.kind == EvalErrorKind::TaskCancelled => {
            handle.cancel();
        }
        Ok(Err(err)) => {
            handle.fail(&failure_details(&err));
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(task = handle.id(), %message, "task panicked");
            handle.fail(&format!("panic: {message}"));
        }
    }
    tracing::trace!(task = handle.id(), "task finished");
}

fn failure_details(err: &EvalError) -> String {
    match err.raised_value() {
        Some(Value::Error(value)) => value.message.clone(),
        Some(other) => other.to_string(),
        None => err.message.clone(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Which built-in executor to use.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExecutorKind {
    #[default]
    Serial,
    Concurrent,
}

impl ExecutorKind {
    /// Read `ABLE_EXECUTOR` (`serial` or `concurrent`), defaulting to serial.
    pub fn from_env() -> Self {
        std::env::var("ABLE_EXECUTOR")
            .ok()
            .and_then(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "serial" => Some(ExecutorKind::Serial),
            "concurrent" | "goroutine" | "threads" => Some(ExecutorKind::Concurrent),
            _ => None,
        }
    }

    pub fn create(self, stack_size: usize) -> Arc<dyn Executor> {
        match self {
            ExecutorKind::Serial => Arc::new(SerialExecutor::new(stack_size)),
            ExecutorKind::Concurrent => Arc::new(ConcurrentExecutor::new(stack_size)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
