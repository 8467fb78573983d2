use std::time::Duration;

use super::*;
use crate::value::Value;
use pretty_assertions::assert_eq;

fn received(outcome: ReceiveOutcome) -> Option<Value> {
    match outcome {
        ReceiveOutcome::Value(value) => Some(value),
        ReceiveOutcome::Closed | ReceiveOutcome::Empty => None,
    }
}

// Channels

#[test]
fn buffered_channel_is_fifo_up_to_capacity() {
    let ch = Channel::new(2);
    assert!(ch.try_send(Value::i32(1)).unwrap());
    assert!(ch.try_send(Value::i32(2)).unwrap());
    assert!(!ch.try_send(Value::i32(3)).unwrap());

    assert_eq!(received(ch.try_receive()), Some(Value::i32(1)));
    assert_eq!(received(ch.try_receive()), Some(Value::i32(2)));
    assert!(matches!(ch.try_receive(), ReceiveOutcome::Empty));
}

#[test]
fn rendezvous_send_needs_waiting_receiver() {
    let ch = Channel::new(0);
    assert!(!ch.try_send(Value::i32(1)).unwrap());

    ch.register_receiver();
    assert!(ch.try_send(Value::i32(1)).unwrap());
    assert!(!ch.try_send(Value::i32(2)).unwrap());
    assert_eq!(received(ch.try_receive()), Some(Value::i32(1)));
    ch.unregister_receiver();
    assert!(ch.is_empty());
}

#[test]
fn withdrawn_receiver_returns_handoff_to_buffer() {
    let ch = Channel::new(0);
    ch.register_receiver();
    assert!(ch.try_send(Value::string("late")).unwrap());
    ch.unregister_receiver();
    assert_eq!(received(ch.try_receive()), Some(Value::string("late")));
}

#[test]
fn closed_channel_drains_then_reports_closed() {
    let ch = Channel::new(1);
    ch.try_send(Value::i32(9)).unwrap();
    ch.close().unwrap();

    assert_eq!(received(ch.try_receive()), Some(Value::i32(9)));
    assert!(matches!(ch.try_receive(), ReceiveOutcome::Closed));
    assert!(ch.is_closed());
}

#[test]
fn send_on_closed_channel_errors() {
    let ch = Channel::new(1);
    ch.close().unwrap();
    let err = ch.try_send(Value::Nil).unwrap_err();
    assert_eq!(err.message, "send on closed channel");
}

#[test]
fn double_close_errors() {
    let ch = Channel::new(0);
    ch.close().unwrap();
    assert_eq!(ch.close().unwrap_err().message, "close of closed channel");
}

// Mutexes

#[test]
fn mutex_lock_unlock() {
    let m = MutexHandle::new();
    assert!(m.try_lock());
    assert!(!m.try_lock());
    assert!(m.is_locked());
    m.unlock().unwrap();
    assert!(!m.is_locked());
}

#[test]
fn unlock_of_unlocked_mutex_errors() {
    let m = MutexHandle::new();
    assert_eq!(m.unlock().unwrap_err().message, "unlock of unlocked mutex");
}

// Notifier

#[test]
fn notifier_reports_change_since_epoch() {
    let notifier = Notifier::new();
    let seen = notifier.epoch();
    assert!(!notifier.wait_since(seen, Duration::from_millis(1)));
    notifier.notify_all();
    assert!(notifier.wait_since(seen, Duration::from_millis(1)));
}

#[test]
fn channel_notifies_on_send() {
    let ch = Channel::new(1);
    let seen = ch.notifier().epoch();
    ch.try_send(Value::Nil).unwrap();
    assert_ne!(ch.notifier().epoch(), seen);
}
