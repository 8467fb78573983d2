use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::Notifier;
use crate::errors::{channel_error, EvalError};

static NEXT_MUTEX_ID: AtomicU64 = AtomicU64::new(1);

struct MutexInner {
    id: u64,
    locked: Mutex<bool>,
    notifier: Notifier,
}

/// Program-level mutex. Not reentrant and not owner-checked: any task may
/// unlock it.
#[derive(Clone)]
pub struct MutexHandle(Arc<MutexInner>);

impl MutexHandle {
    pub fn new() -> Self {
        MutexHandle(Arc::new(MutexInner {
            id: NEXT_MUTEX_ID.fetch_add(1, Ordering::Relaxed),
            locked: Mutex::new(false),
            notifier: Notifier::new(),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn notifier(&self) -> &Notifier {
        &self.0.notifier
    }

    /// Acquire if free.
    pub fn try_lock(&self) -> bool {
        let mut locked = self.0.locked.lock();
        if *locked {
            false
        } else {
            *locked = true;
            true
        }
    }

    pub fn unlock(&self) -> Result<(), EvalError> {
        let mut locked = self.0.locked.lock();
        if !*locked {
            return Err(channel_error("unlock of unlocked mutex"));
        }
        *locked = false;
        drop(locked);
        self.0.notifier.notify_all();
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        *self.0.locked.lock()
    }
}

impl Default for MutexHandle {
    fn default() -> Self {
        Self::new()
    }
}
