//! One-shot result cells behind `proc` and `spawn`.
//!
//! A handle starts `Pending` and moves exactly once to `Resolved`,
//! `Cancelled`, or `Failed`. Later completion attempts are ignored, so a
//! task finishing after a cancel cannot overwrite the cancelled outcome.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::value::{ErrorValue, Value};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Which construct created the task.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Proc,
    Future,
}

impl TaskKind {
    pub const fn label(self) -> &'static str {
        match self {
            TaskKind::Proc => "Proc",
            TaskKind::Future => "Future",
        }
    }

    /// Failure value for a task whose body raised or panicked.
    pub fn failure(self, details: &str) -> Value {
        Value::error_value(
            ErrorValue::new(format!("{} failed: {details}", self.label()))
                .with_type("ProcError")
                .with_field("details", Value::string(details)),
        )
    }

    /// Failure value for a cancelled task.
    pub fn cancellation(self) -> Value {
        let message = format!("{} cancelled", self.label());
        Value::error_value(
            ErrorValue::new(message.clone())
                .with_type("ProcError")
                .with_field("details", Value::string(message)),
        )
    }
}

/// Task state. The payload of `Cancelled` and `Failed` is an error value.
#[derive(Clone, Debug)]
pub enum TaskStatus {
    Pending,
    Resolved(Value),
    Cancelled(Value),
    Failed(Value),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }

    /// Result exposed by `value()`: the resolved value or the failure.
    pub fn outcome(&self) -> Option<Value> {
        match self {
            TaskStatus::Pending => None,
            TaskStatus::Resolved(value)
            | TaskStatus::Cancelled(value)
            | TaskStatus::Failed(value) => Some(value.clone()),
        }
    }
}

struct TaskCell {
    id: u64,
    kind: TaskKind,
    status: Mutex<TaskStatus>,
    cancel_requested: AtomicBool,
    started: AtomicBool,
}

/// Shared handle to a task's result cell.
#[derive(Clone)]
pub struct TaskHandle(Arc<TaskCell>);

impl TaskHandle {
    pub fn new(kind: TaskKind) -> Self {
        TaskHandle(Arc::new(TaskCell {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            status: Mutex::new(TaskStatus::Pending),
            cancel_requested: AtomicBool::new(false),
            started: AtomicBool::new(false),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn kind(&self) -> TaskKind {
        self.0.kind
    }

    pub fn status(&self) -> TaskStatus {
        self.0.status.lock().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.0.status.lock().is_terminal()
    }

    /// Ask the task to stop. Returns `false` if it already finished.
    pub fn request_cancel(&self) -> bool {
        if self.is_ready() {
            return false;
        }
        self.0.cancel_requested.store(true, Ordering::SeqCst);
        tracing::trace!(task = self.id(), "cancel requested");
        true
    }

    pub fn cancel_requested(&self) -> bool {
        self.0.cancel_requested.load(Ordering::SeqCst)
    }

    /// Record that the body began running. Returns `false` on a second call.
    pub fn mark_started(&self) -> bool {
        !self.0.started.swap(true, Ordering::SeqCst)
    }

    /// Cancel a task whose body has not begun. Claims the start flag, so
    /// a runner that loses the race sees `mark_started` return `false`.
    pub fn cancel_unstarted(&self) -> bool {
        if self.0.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.cancel()
    }

    /// Move to a terminal state. Returns `false` if already terminal.
    pub fn complete(&self, status: TaskStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }
        let mut current = self.0.status.lock();
        if current.is_terminal() {
            return false;
        }
        *current = status;
        true
    }

    pub fn resolve(&self, value: Value) -> bool {
        self.complete(TaskStatus::Resolved(value))
    }

    pub fn fail(&self, details: &str) -> bool {
        self.complete(TaskStatus::Failed(self.kind().failure(details)))
    }

    pub fn cancel(&self) -> bool {
        self.complete(TaskStatus::Cancelled(self.kind().cancellation()))
    }

    pub fn ptr_eq(&self, other: &TaskHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn completion_is_one_shot() {
        let handle = TaskHandle::new(TaskKind::Proc);
        assert!(handle.resolve(Value::i32(1)));
        assert!(!handle.fail("late"));
        assert!(!handle.cancel());
        assert_eq!(handle.status().outcome(), Some(Value::i32(1)));
    }

    #[test]
    fn cancel_request_after_completion_is_refused() {
        let handle = TaskHandle::new(TaskKind::Future);
        handle.resolve(Value::Nil);
        assert!(!handle.request_cancel());
        assert!(!handle.cancel_requested());
    }

    #[test]
    fn failure_message_names_kind() {
        let handle = TaskHandle::new(TaskKind::Proc);
        handle.fail("boom");
        let Some(Value::Error(err)) = handle.status().outcome() else {
            panic!("expected error outcome");
        };
        assert_eq!(err.message, "Proc failed: boom");
        assert_eq!(err.field("details"), Some(&Value::string("boom")));

        let future = TaskHandle::new(TaskKind::Future);
        future.cancel();
        let Some(Value::Error(err)) = future.status().outcome() else {
            panic!("expected error outcome");
        };
        assert_eq!(err.message, "Future cancelled");
    }

    #[test]
    fn start_is_claimed_once() {
        let handle = TaskHandle::new(TaskKind::Proc);
        assert!(handle.mark_started());
        assert!(!handle.mark_started());
        assert!(!handle.cancel_unstarted());
        assert!(!handle.is_ready());
    }

    #[test]
    fn cancel_unstarted_wins_against_a_later_start() {
        let handle = TaskHandle::new(TaskKind::Future);
        assert!(handle.cancel_unstarted());
        assert!(!handle.mark_started());
        assert_eq!(
            handle.status().outcome(),
            Some(TaskKind::Future.cancellation())
        );
    }

    #[test]
    fn start_and_cancel_race_has_one_winner() {
        for _ in 0..64 {
            let handle = TaskHandle::new(TaskKind::Proc);
            let runner = handle.clone();
            let thread = std::thread::spawn(move || runner.mark_started());
            let cancelled = handle.cancel_unstarted();
            let started = thread.join().unwrap();
            assert!(cancelled != started);
            assert_eq!(handle.is_ready(), cancelled);
        }
    }
}
