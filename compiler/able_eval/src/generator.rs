//! Coroutine-style iterator literals.
//!
//! `Iterator { gen => ... }` runs its body on a dedicated worker thread.
//! The consumer and the worker take strict turns over two rendezvous
//! channels: `next()` sends a request and blocks for the step the body
//! produces; `gen.yield(v)` sends the step and blocks for the next request.
//! The worker is started lazily by the first `next()`.
//!
//! Closing sends a close request to a suspended worker. Its pending `yield`
//! then fails with a closed-iterator error that unwinds the body, running
//! any `ensure` blocks on the way out. A close that arrives while a `next()`
//! is outstanding, including one from the body itself, only flags the
//! worker; its next `yield` unwinds the same way.
//!
//! No lock is held while waiting on the worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use able_runtime::errors::{generator_closed, iterator_reentered, yield_after_close};
use able_runtime::value::GeneratorControl;
use able_runtime::{CallContext, EvalError, EvalErrorKind, EvalResult, IteratorSource, Signal, Value};
use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

/// Runs the generator body against its controller.
pub type GeneratorBody = Box<dyn FnOnce(Arc<dyn GeneratorControl>) -> EvalResult + Send>;

enum Request {
    Next,
    Close,
}

enum Step {
    Yielded(Value),
    Finished,
    Failed(EvalError),
}

/// Worker-side half of the handoff.
struct Controller {
    requests: Receiver<Request>,
    steps: Sender<Step>,
    closed: AtomicBool,
    /// Set by a consumer that closed the iterator mid-step.
    closing: Arc<AtomicBool>,
}

impl GeneratorControl for Controller {
    fn yield_value(&self, value: Value) -> Result<(), EvalError> {
        if self.closing.load(Ordering::SeqCst) {
            self.closed.store(true, Ordering::SeqCst);
            return Err(generator_closed());
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(yield_after_close());
        }
        if self.steps.send(Step::Yielded(value)).is_err() {
            self.closed.store(true, Ordering::SeqCst);
            return Err(generator_closed());
        }
        match self.requests.recv() {
            Ok(Request::Next) => Ok(()),
            Ok(Request::Close) | Err(_) => {
                self.closed.store(true, Ordering::SeqCst);
                Err(generator_closed())
            }
        }
    }

    fn stop(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Consumer-side link to a started worker.
#[derive(Clone)]
struct Link {
    requests: Sender<Request>,
    steps: Receiver<Step>,
    closing: Arc<AtomicBool>,
}

#[derive(Default)]
struct State {
    /// Taken by the first `next()`.
    body: Option<GeneratorBody>,
    link: Option<Link>,
    done: bool,
}

/// Iterator source backed by a generator body.
pub struct GeneratorIterator {
    state: Mutex<State>,
    /// Set while a `next()` is outstanding.
    busy: AtomicBool,
    stack_size: usize,
}

impl GeneratorIterator {
    pub fn new(body: GeneratorBody, stack_size: usize) -> Self {
        GeneratorIterator {
            state: Mutex::new(State {
                body: Some(body),
                link: None,
                done: false,
            }),
            busy: AtomicBool::new(false),
            stack_size,
        }
    }

    fn start(&self, body: GeneratorBody) -> Result<Link, EvalError> {
        let (request_tx, request_rx) = bounded(0);
        let (step_tx, step_rx) = bounded(0);
        let closing = Arc::new(AtomicBool::new(false));
        let controller = Arc::new(Controller {
            requests: request_rx,
            steps: step_tx.clone(),
            closed: AtomicBool::new(false),
            closing: Arc::clone(&closing),
        });
        thread::Builder::new()
            .name("able-generator".to_string())
            .stack_size(self.stack_size)
            .spawn(move || {
                // Wait for the first request before running anything.
                if !matches!(controller.requests.recv(), Ok(Request::Next)) {
                    return;
                }
                let control: Arc<dyn GeneratorControl> = Arc::clone(&controller) as _;
                let step = match body(control) {
                    Ok(_) => Step::Finished,
                    Err(err) => finish_step(err),
                };
                // The consumer may have gone away; nothing is waiting then.
                let _ = step_tx.send(step);
            })
            .map_err(|err| EvalError::new(format!("failed to start generator: {err}")))?;
        Ok(Link {
            requests: request_tx,
            steps: step_rx,
            closing,
        })
    }

    /// The link to drive, starting the worker on first use.
    fn link(&self) -> Result<Option<Link>, EvalError> {
        let mut state = self.state.lock();
        if state.done {
            return Ok(None);
        }
        if state.link.is_none() {
            let Some(body) = state.body.take() else {
                state.done = true;
                return Ok(None);
            };
            state.link = Some(self.start(body)?);
        }
        Ok(state.link.clone())
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.done = true;
        state.link = None;
    }

    fn advance(&self) -> EvalResult {
        let Some(link) = self.link()? else {
            return Ok(Value::IteratorEnd);
        };
        if link.requests.send(Request::Next).is_err() {
            self.finish();
            return Ok(Value::IteratorEnd);
        }
        match link.steps.recv() {
            Ok(Step::Yielded(value)) => Ok(value),
            Ok(Step::Finished) | Err(_) => {
                self.finish();
                Ok(Value::IteratorEnd)
            }
            Ok(Step::Failed(err)) => {
                self.finish();
                Err(err)
            }
        }
    }
}

/// How a body that stopped with an error ends the sequence.
fn finish_step(err: EvalError) -> Step {
    if err.kind == EvalErrorKind::GeneratorClosed || matches!(err.signal, Some(Signal::Return(_))) {
        Step::Finished
    } else {
        Step::Failed(err)
    }
}

/// Clears the busy flag when a `next()` finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl IteratorSource for GeneratorIterator {
    fn next(&self, _ctx: &mut dyn CallContext) -> EvalResult {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(iterator_reentered());
        }
        let _busy = BusyGuard(&self.busy);
        self.advance()
    }

    fn close(&self) {
        let link = {
            let mut state = self.state.lock();
            if state.done {
                return;
            }
            state.done = true;
            state.body = None;
            state.link.take()
        };
        let Some(link) = link else {
            tracing::trace!("generator closed before start");
            return;
        };
        if self.busy.load(Ordering::SeqCst) {
            // The worker is mid-step; it unwinds at its next yield.
            link.closing.store(true, Ordering::SeqCst);
            tracing::trace!("generator close deferred to next yield");
            return;
        }
        // A suspended worker takes the request and unwinds; wait for its
        // final step so the body has ended when close returns.
        if link.requests.send(Request::Close).is_ok() {
            let _ = link.steps.recv();
        }
        tracing::trace!("generator closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
