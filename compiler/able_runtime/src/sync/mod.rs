//! Channel and mutex primitives.
//!
//! Every operation here is non-blocking. Blocking `send`, `receive`, and
//! `lock` are built by the evaluator's executor on top of these `try_*`
//! operations plus a [`Notifier`], so a serial scheduler can requeue a
//! blocked task instead of parking its thread.

mod channel;
mod mutex;

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

pub use channel::{Channel, ReceiveOutcome};
pub use mutex::MutexHandle;

/// Epoch counter that wakes waiters whenever the guarded state changes.
#[derive(Default)]
pub struct Notifier {
    epoch: Mutex<u64>,
    changed: Condvar,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch; pass it to [`Notifier::wait_since`].
    pub fn epoch(&self) -> u64 {
        *self.epoch.lock()
    }

    pub fn notify_all(&self) {
        let mut epoch = self.epoch.lock();
        *epoch = epoch.wrapping_add(1);
        drop(epoch);
        self.changed.notify_all();
    }

    /// Wait until the epoch moves past `seen` or `timeout` elapses.
    /// Returns `true` if a change was observed.
    pub fn wait_since(&self, seen: u64, timeout: Duration) -> bool {
        let mut epoch = self.epoch.lock();
        if *epoch != seen {
            return true;
        }
        self.changed.wait_for(&mut epoch, timeout);
        *epoch != seen
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
