use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::Notifier;
use crate::errors::{channel_error, EvalError};
use crate::value::Value;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Result of a non-blocking receive.
#[derive(Debug)]
pub enum ReceiveOutcome {
    Value(Value),
    /// Closed and drained.
    Closed,
    /// Nothing available yet.
    Empty,
}

struct ChannelState {
    buffer: VecDeque<Value>,
    /// Values passed directly to receivers blocked in `receive`.
    handoff: VecDeque<Value>,
    waiting_receivers: usize,
    closed: bool,
}

struct ChannelInner {
    id: u64,
    capacity: usize,
    state: Mutex<ChannelState>,
    notifier: Notifier,
}

/// Bounded channel; capacity 0 is a rendezvous channel.
///
/// A send on a rendezvous channel only completes when a receiver is
/// blocked waiting for it.
#[derive(Clone)]
pub struct Channel(Arc<ChannelInner>);

impl Channel {
    pub fn new(capacity: usize) -> Self {
        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(channel = id, capacity, "channel created");
        Channel(Arc::new(ChannelInner {
            id,
            capacity,
            state: Mutex::new(ChannelState {
                buffer: VecDeque::with_capacity(capacity),
                handoff: VecDeque::new(),
                waiting_receivers: 0,
                closed: false,
            }),
            notifier: Notifier::new(),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn capacity(&self) -> usize {
        self.0.capacity
    }

    /// Signalled on every state change.
    pub fn notifier(&self) -> &Notifier {
        &self.0.notifier
    }

    /// Deliver `value` if there is buffer room or a blocked receiver.
    /// `Ok(false)` means the send would block.
    pub fn try_send(&self, value: Value) -> Result<bool, EvalError> {
        let mut state = self.0.state.lock();
        if state.closed {
            return Err(channel_error("send on closed channel"));
        }
        if state.buffer.len() < self.0.capacity {
            state.buffer.push_back(value);
        } else if state.waiting_receivers > state.handoff.len() {
            state.handoff.push_back(value);
        } else {
            return Ok(false);
        }
        drop(state);
        self.0.notifier.notify_all();
        Ok(true)
    }

    pub fn try_receive(&self) -> ReceiveOutcome {
        let mut state = self.0.state.lock();
        let value = match state.buffer.pop_front() {
            Some(value) => value,
            None => match state.handoff.pop_front() {
                Some(value) => value,
                None if state.closed => return ReceiveOutcome::Closed,
                None => return ReceiveOutcome::Empty,
            },
        };
        drop(state);
        self.0.notifier.notify_all();
        ReceiveOutcome::Value(value)
    }

    /// Announce a receiver that is about to block, enabling rendezvous
    /// sends.
    pub fn register_receiver(&self) {
        self.0.state.lock().waiting_receivers += 1;
        self.0.notifier.notify_all();
    }

    /// Withdraw a blocked receiver. Values handed off beyond the remaining
    /// receivers go back to the front of the buffer.
    pub fn unregister_receiver(&self) {
        let mut state = self.0.state.lock();
        state.waiting_receivers = state.waiting_receivers.saturating_sub(1);
        while state.handoff.len() > state.waiting_receivers {
            match state.handoff.pop_back() {
                Some(value) => state.buffer.push_front(value),
                None => break,
            }
        }
    }

    pub fn close(&self) -> Result<(), EvalError> {
        let mut state = self.0.state.lock();
        if state.closed {
            return Err(channel_error("close of closed channel"));
        }
        state.closed = true;
        drop(state);
        tracing::trace!(channel = self.0.id, "channel closed");
        self.0.notifier.notify_all();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.0.state.lock().closed
    }

    /// Buffered values not yet received.
    pub fn len(&self) -> usize {
        let state = self.0.state.lock();
        state.buffer.len() + state.handoff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
