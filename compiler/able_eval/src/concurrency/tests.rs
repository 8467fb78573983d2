use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use able_runtime::{
    Channel, EvalError, EvalErrorKind, ReceiveOutcome, TaskKind, TaskStatus, Value,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::*;

const STACK: usize = 2 * 1024 * 1024;

fn error_message(status: &TaskStatus) -> String {
    match status.outcome() {
        Some(Value::Error(err)) => err.message.clone(),
        other => panic!("expected error outcome, got {other:?}"),
    }
}

#[test]
fn serial_runs_tasks_in_spawn_order() {
    let executor = SerialExecutor::new(STACK);
    let log = Arc::new(Mutex::new(Vec::new()));
    for n in 1..=3 {
        let log = Arc::clone(&log);
        executor.run_proc(Box::new(move |_| {
            log.lock().push(n);
            Ok(Value::Void)
        }));
    }
    assert_eq!(executor.pending_tasks(), 3);
    assert!(log.lock().is_empty());

    executor.flush();
    assert_eq!(*log.lock(), vec![1, 2, 3]);
    assert_eq!(executor.pending_tasks(), 0);
}

#[test]
fn serial_yield_interleaves_tasks() {
    let executor = Arc::new(SerialExecutor::new(STACK));
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "b"] {
        let log = Arc::clone(&log);
        let inner = Arc::clone(&executor);
        executor.run_proc(Box::new(move |ctx| {
            log.lock().push(format!("{name}1"));
            inner.yield_now(Some(&ctx));
            log.lock().push(format!("{name}2"));
            Ok(Value::Void)
        }));
    }
    executor.flush();
    assert_eq!(*log.lock(), vec!["a1", "b1", "a2", "b2"]);
}

#[test]
fn serial_cancel_before_start_skips_body() {
    let executor = SerialExecutor::new(STACK);
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let handle = executor.run_proc(Box::new(move |_| {
        flag.store(true, Ordering::SeqCst);
        Ok(Value::Void)
    }));
    assert!(handle.request_cancel());
    executor.flush();

    assert!(!ran.load(Ordering::SeqCst));
    assert!(matches!(handle.status(), TaskStatus::Cancelled(_)));
    assert_eq!(error_message(&handle.status()), "Proc cancelled");
}

#[test]
fn claimed_start_keeps_the_body_from_running() {
    let executor = SerialExecutor::new(STACK);
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let handle = executor.run_future(Box::new(move |_| {
        flag.store(true, Ordering::SeqCst);
        Ok(Value::Void)
    }));
    assert!(handle.cancel_unstarted());
    executor.flush();

    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(error_message(&handle.status()), "Future cancelled");
    assert_eq!(executor.pending_tasks(), 0);
}

#[test]
fn raised_error_becomes_failure() {
    let executor = SerialExecutor::new(STACK);
    let handle = executor.run_future(Box::new(|_| {
        Err(EvalError::raise(Value::error("bad input")))
    }));
    executor.flush();
    assert!(matches!(handle.status(), TaskStatus::Failed(_)));
    assert_eq!(error_message(&handle.status()), "Future failed: bad input");
}

#[test]
fn panic_becomes_failure() {
    let executor = SerialExecutor::new(STACK);
    let handle = executor.run_proc(Box::new(|_| panic!("boom")));
    executor.flush();
    assert_eq!(error_message(&handle.status()), "Proc failed: panic: boom");
}

#[test]
fn host_await_drives_serial_tasks() {
    let executor = SerialExecutor::new(STACK);
    let handle = executor.run_future(Box::new(|_| Ok(Value::i32(42))));
    let value = await_handle(&executor, None, &handle).unwrap();
    assert_eq!(value, Value::i32(42));
}

#[test]
fn blocked_task_resumes_after_other_task_progresses() {
    let executor = Arc::new(SerialExecutor::new(STACK));
    let flag = Arc::new(AtomicBool::new(false));

    let waiter = {
        let inner = Arc::clone(&executor);
        let flag = Arc::clone(&flag);
        executor.run_proc(Box::new(move |ctx| {
            inner.block_on(Some(&ctx), None, &mut || {
                Ok(flag.load(Ordering::SeqCst).then_some(Value::string("woke")))
            })
        }))
    };
    {
        let flag = Arc::clone(&flag);
        executor.run_proc(Box::new(move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(Value::Void)
        }));
    }
    executor.flush();
    assert_eq!(waiter.status().outcome(), Some(Value::string("woke")));
}

#[test]
fn host_block_with_no_runnable_work_is_deadlock() {
    let executor = SerialExecutor::new(STACK);
    let err = executor.block_on(None, None, &mut || Ok(None)).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Deadlock);
    assert_eq!(err.message, "deadlock: all tasks are blocked");
}

#[test]
fn flush_stops_when_every_task_is_blocked() {
    let executor = Arc::new(SerialExecutor::new(STACK));
    for _ in 0..2 {
        let inner = Arc::clone(&executor);
        executor.run_proc(Box::new(move |ctx| {
            inner.block_on(Some(&ctx), None, &mut || Ok(None))
        }));
    }
    executor.flush();
    assert_eq!(executor.pending_tasks(), 2);
}

#[test]
fn serial_rendezvous_when_sender_blocks_first() {
    let executor = Arc::new(SerialExecutor::new(STACK));
    let channel = Channel::new(0);

    let sender = {
        let inner = Arc::clone(&executor);
        let channel = channel.clone();
        executor.run_proc(Box::new(move |ctx| {
            inner.block_on(Some(&ctx), Some(channel.notifier()), &mut || {
                Ok(channel.try_send(Value::i32(7))?.then_some(Value::Void))
            })
        }))
    };
    let receiver = {
        let inner = Arc::clone(&executor);
        let channel = channel.clone();
        executor.run_future(Box::new(move |ctx| {
            channel.register_receiver();
            let received = inner.block_on(Some(&ctx), Some(channel.notifier()), &mut || {
                Ok(match channel.try_receive() {
                    ReceiveOutcome::Value(value) => Some(value),
                    _ => None,
                })
            });
            channel.unregister_receiver();
            received
        }))
    };

    executor.flush();
    assert_eq!(receiver.status().outcome(), Some(Value::i32(7)));
    assert_eq!(sender.status().outcome(), Some(Value::Void));
    assert_eq!(executor.pending_tasks(), 0);
}

#[test]
fn serial_stalls_when_only_retries_remain() {
    let executor = Arc::new(SerialExecutor::new(STACK));
    let channel = Channel::new(0);
    for _ in 0..2 {
        let inner = Arc::clone(&executor);
        let channel = channel.clone();
        executor.run_proc(Box::new(move |ctx| {
            inner.block_on(Some(&ctx), Some(channel.notifier()), &mut || {
                Ok(channel.try_send(Value::i32(1))?.then_some(Value::Void))
            })
        }));
    }
    executor.flush();
    assert_eq!(executor.pending_tasks(), 2);
}

#[test]
fn concurrent_flush_waits_for_all_tasks() {
    let executor = ConcurrentExecutor::new(STACK);
    let counter = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let counter = Arc::clone(&counter);
            executor.run_proc(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Void)
            }))
        })
        .collect();
    executor.flush();
    assert_eq!(counter.load(Ordering::SeqCst), 4);
    assert_eq!(executor.pending_tasks(), 0);
    assert!(handles.iter().all(|handle| handle.is_ready()));
}

#[test]
fn concurrent_cancel_interrupts_blocked_task() {
    let executor = Arc::new(ConcurrentExecutor::new(STACK));
    let inner = Arc::clone(&executor);
    let handle = executor.run_proc(Box::new(move |ctx| {
        inner.block_on(Some(&ctx), None, &mut || Ok(None))
    }));
    handle.request_cancel();
    let outcome = await_handle(executor.as_ref(), None, &handle).unwrap();
    let Value::Error(err) = outcome else {
        panic!("expected cancellation error");
    };
    assert_eq!(err.message, "Proc cancelled");
    assert_eq!(handle.kind(), TaskKind::Proc);
}

#[test]
fn executor_kind_parses_names() {
    assert_eq!(ExecutorKind::parse("serial"), Some(ExecutorKind::Serial));
    assert_eq!(ExecutorKind::parse(" Goroutine "), Some(ExecutorKind::Concurrent));
    assert_eq!(ExecutorKind::parse("threads"), Some(ExecutorKind::Concurrent));
    assert_eq!(ExecutorKind::parse("fibers"), None);
    assert_eq!(ExecutorKind::Serial.create(STACK).name(), "serial");
    assert_eq!(ExecutorKind::Concurrent.create(STACK).name(), "concurrent");
}
