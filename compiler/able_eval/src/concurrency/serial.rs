//! Deterministic single-runner scheduler.
//!
//! Each task still gets its own thread (its body may suspend deep inside
//! the evaluator), but a baton decides which one may run: only the task
//! whose id is in `running` makes progress. The driving thread hands the
//! baton to the front of the ready queue and waits for it to come back.
//!
//! A task hands the baton back when it finishes, yields, or blocks. Yields
//! and blocks requeue it at the back. A blocked task that retries and finds
//! its wake notifier unchanged since its last failed attempt is stalled. A
//! drive stops once every queued task has stalled in a row.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use able_runtime::errors::{deadlock, task_cancelled};
use able_runtime::{EvalError, EvalResult, Notifier, TaskHandle, TaskKind, Value};
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use super::{run_task_body, AsyncContext, Executor, TaskBody};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Suspension {
    Yield,
    /// Blocked for the first time, or after the awaited state changed.
    Blocked,
    /// Blocked again with nothing changed since the last attempt.
    Stalled,
    Finished,
}

struct Slot {
    handle: TaskHandle,
    /// Taken when the task's thread starts.
    body: Option<TaskBody>,
}

#[derive(Default)]
struct SerialState {
    ready: VecDeque<u64>,
    slots: FxHashMap<u64, Slot>,
    running: Option<u64>,
    /// How the running task handed the baton back.
    handback: Option<Suspension>,
    /// Consecutive stalled slices.
    blocked_streak: usize,
}

struct SerialInner {
    state: Mutex<SerialState>,
    turn: Condvar,
    stack_size: usize,
}

/// Runs one task at a time, in FIFO order, when the host drives it.
pub struct SerialExecutor {
    inner: Arc<SerialInner>,
}

impl SerialExecutor {
    pub fn new(stack_size: usize) -> Self {
        SerialExecutor {
            inner: Arc::new(SerialInner {
                state: Mutex::new(SerialState::default()),
                turn: Condvar::new(),
                stack_size,
            }),
        }
    }

    /// Run the next ready task until it hands the baton back.
    ///
    /// Returns `false` when nothing can run: the queue is empty, every
    /// queued task is stalled, or a task already holds the baton.
    fn step(&self) -> bool {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.running.is_some()
            || state.ready.is_empty()
            || state.blocked_streak >= state.ready.len()
        {
            return false;
        }
        let Some(id) = state.ready.pop_front() else {
            return false;
        };
        let Some(slot) = state.slots.get_mut(&id) else {
            return true;
        };

        if let Some(body) = slot.body.take() {
            if slot.handle.is_ready() {
                state.slots.remove(&id);
                state.blocked_streak = 0;
                return true;
            }
            let handle = slot.handle.clone();
            state.running = Some(id);
            state.handback = None;
            if let Err(err) = self.start_thread(id, handle.clone(), body) {
                state.running = None;
                state.slots.remove(&id);
                handle.fail(&format!("failed to start task thread: {err}"));
                return true;
            }
        } else {
            state.running = Some(id);
            state.handback = None;
            inner.turn.notify_all();
        }

        while state.handback.is_none() {
            inner.turn.wait(&mut state);
        }
        let handback = state.handback.take();
        state.running = None;
        match handback {
            Some(Suspension::Finished) => {
                state.slots.remove(&id);
                state.blocked_streak = 0;
            }
            Some(Suspension::Yield | Suspension::Blocked) => {
                state.ready.push_back(id);
                state.blocked_streak = 0;
            }
            Some(Suspension::Stalled) | None => {
                state.ready.push_back(id);
                state.blocked_streak += 1;
            }
        }
        tracing::trace!(task = id, ?handback, queued = state.ready.len(), "serial slice done");
        true
    }

    fn start_thread(&self, id: u64, handle: TaskHandle, body: TaskBody) -> std::io::Result<()> {
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name(format!("able-{}-{id}", handle.kind().label().to_ascii_lowercase()))
            .stack_size(self.inner.stack_size)
            .spawn(move || {
                {
                    let mut state = inner.state.lock();
                    while state.running != Some(id) {
                        inner.turn.wait(&mut state);
                    }
                }
                run_task_body(&handle, body);
                let mut state = inner.state.lock();
                state.handback = Some(Suspension::Finished);
                drop(state);
                inner.turn.notify_all();
            })
            .map(|_| ())
    }

    /// Hand the baton back from the running task and wait for it again.
    fn suspend(&self, current: &AsyncContext, how: Suspension) {
        let id = current.handle().id();
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.running != Some(id) {
            return;
        }
        state.handback = Some(how);
        inner.turn.notify_all();
        while state.running != Some(id) || state.handback.is_some() {
            inner.turn.wait(&mut state);
        }
    }

    fn note_progress(&self) {
        self.inner.state.lock().blocked_streak = 0;
    }
}

impl Executor for SerialExecutor {
    fn spawn(&self, kind: TaskKind, body: TaskBody) -> TaskHandle {
        let handle = TaskHandle::new(kind);
        let mut state = self.inner.state.lock();
        state.slots.insert(
            handle.id(),
            Slot {
                handle: handle.clone(),
                body: Some(body),
            },
        );
        state.ready.push_back(handle.id());
        state.blocked_streak = 0;
        tracing::trace!(task = handle.id(), ?kind, "task queued");
        handle
    }

    fn flush(&self) {
        while self.step() {}
    }

    fn pending_tasks(&self) -> usize {
        self.inner.state.lock().slots.len()
    }

    fn yield_now(&self, current: Option<&AsyncContext>) {
        if let Some(current) = current {
            self.suspend(current, Suspension::Yield);
        }
    }

    fn block_on(
        &self,
        current: Option<&AsyncContext>,
        wake: Option<&Notifier>,
        attempt: &mut dyn FnMut() -> Result<Option<Value>, EvalError>,
    ) -> EvalResult {
        if let Some(current) = current {
            // Wake epoch after the previous failed attempt.
            let mut last_seen: Option<Option<u64>> = None;
            loop {
                if current.is_cancelled() {
                    return Err(task_cancelled());
                }
                if let Some(value) = attempt()? {
                    self.note_progress();
                    return Ok(value);
                }
                let seen = wake.map(Notifier::epoch);
                let how = if last_seen == Some(seen) {
                    Suspension::Stalled
                } else {
                    Suspension::Blocked
                };
                last_seen = Some(seen);
                self.suspend(current, how);
            }
        }

        loop {
            if let Some(value) = attempt()? {
                self.note_progress();
                return Ok(value);
            }
            if !self.step() {
                if let Some(value) = attempt()? {
                    self.note_progress();
                    return Ok(value);
                }
                return Err(deadlock());
            }
        }
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}
