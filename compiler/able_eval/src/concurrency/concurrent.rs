//! Thread-per-task scheduler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use able_runtime::errors::task_cancelled;
use able_runtime::{EvalError, EvalResult, Notifier, TaskHandle, TaskKind, Value};

use super::{run_task_body, AsyncContext, Executor, TaskBody};

/// Upper bound on how long a blocked attempt sleeps before retrying.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

struct ConcurrentInner {
    /// Tasks spawned and not yet finished.
    live: AtomicUsize,
    /// Live tasks currently waiting inside `block_on`.
    blocked: AtomicUsize,
    /// Signalled on every task exit and every block/unblock.
    changed: Notifier,
    stack_size: usize,
}

/// Runs every task on its own OS thread as soon as it is spawned.
pub struct ConcurrentExecutor {
    inner: Arc<ConcurrentInner>,
}

impl ConcurrentExecutor {
    pub fn new(stack_size: usize) -> Self {
        ConcurrentExecutor {
            inner: Arc::new(ConcurrentInner {
                live: AtomicUsize::new(0),
                blocked: AtomicUsize::new(0),
                changed: Notifier::new(),
                stack_size,
            }),
        }
    }
}

/// Counts the current task as blocked for as long as it lives.
struct BlockedGuard<'a>(&'a ConcurrentInner);

impl<'a> BlockedGuard<'a> {
    fn enter(inner: &'a ConcurrentInner) -> Self {
        inner.blocked.fetch_add(1, Ordering::SeqCst);
        inner.changed.notify_all();
        BlockedGuard(inner)
    }
}

impl Drop for BlockedGuard<'_> {
    fn drop(&mut self) {
        self.0.blocked.fetch_sub(1, Ordering::SeqCst);
        self.0.changed.notify_all();
    }
}

impl Executor for ConcurrentExecutor {
    fn spawn(&self, kind: TaskKind, body: TaskBody) -> TaskHandle {
        let handle = TaskHandle::new(kind);
        let inner = Arc::clone(&self.inner);
        inner.live.fetch_add(1, Ordering::SeqCst);

        let task = handle.clone();
        let worker_inner = Arc::clone(&inner);
        let spawned = thread::Builder::new()
            .name(format!("able-{}-{}", kind.label().to_ascii_lowercase(), handle.id()))
            .stack_size(inner.stack_size)
            .spawn(move || {
                run_task_body(&task, body);
                worker_inner.live.fetch_sub(1, Ordering::SeqCst);
                worker_inner.changed.notify_all();
            });
        if let Err(err) = spawned {
            inner.live.fetch_sub(1, Ordering::SeqCst);
            inner.changed.notify_all();
            handle.fail(&format!("failed to start task thread: {err}"));
        }
        tracing::trace!(task = handle.id(), ?kind, "task spawned");
        handle
    }

    fn flush(&self) {
        let inner = &self.inner;
        loop {
            let seen = inner.changed.epoch();
            if inner.live.load(Ordering::SeqCst) <= inner.blocked.load(Ordering::SeqCst) {
                return;
            }
            inner.changed.wait_since(seen, POLL_INTERVAL);
        }
    }

    fn pending_tasks(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    fn yield_now(&self, _current: Option<&AsyncContext>) {
        thread::yield_now();
    }

    fn block_on(
        &self,
        current: Option<&AsyncContext>,
        wake: Option<&Notifier>,
        attempt: &mut dyn FnMut() -> Result<Option<Value>, EvalError>,
    ) -> EvalResult {
        let _blocked = current.map(|_| BlockedGuard::enter(&self.inner));
        let notifier = wake.unwrap_or(&self.inner.changed);
        loop {
            if current.is_some_and(AsyncContext::is_cancelled) {
                return Err(task_cancelled());
            }
            let seen = notifier.epoch();
            if let Some(value) = attempt()? {
                return Ok(value);
            }
            notifier.wait_since(seen, POLL_INTERVAL);
        }
    }

    fn name(&self) -> &'static str {
        "concurrent"
    }
}
