//! Proc primitives, channels, and mutexes.
//!
//! Blocking operations go through [`Executor::block_on`](crate::Executor::block_on)
//! with the primitive's notifier, so the serial executor can run other
//! tasks while one waits.

use std::sync::Arc;

use able_ir::Name;
use able_runtime::errors::{outside_async_task, type_mismatch};
use able_runtime::{
    CallContext, Channel, EvalError, EvalResult, MutexHandle, ReceiveOutcome, Value,
};

use super::take;
use crate::concurrency::{AsyncContext, Executor};
use crate::interpreter::Interpreter;

pub(super) fn install(interpreter: &Interpreter) {
    let shared = &interpreter.shared;
    let define = |name: &str, value: Value| shared.globals.define(Name::new(name), value);

    let executor = Arc::clone(&shared.executor);
    define(
        "proc_yield",
        Value::native("proc_yield", Some(0), move |ctx, _| {
            let current = require_task(ctx, "proc_yield")?;
            executor.yield_now(Some(&*current));
            Ok(Value::Void)
        }),
    );

    define(
        "proc_cancelled",
        Value::native("proc_cancelled", Some(0), |ctx, _| {
            let current = require_task(ctx, "proc_cancelled")?;
            Ok(Value::Bool(current.is_cancelled()))
        }),
    );

    let executor = Arc::clone(&shared.executor);
    define(
        "proc_flush",
        Value::native("proc_flush", Some(0), move |ctx, _| {
            // A task cannot drain the queue it runs on; it steps aside instead.
            match current_task(ctx) {
                Some(current) => executor.yield_now(Some(&*current)),
                None => executor.flush(),
            }
            Ok(Value::Void)
        }),
    );

    let executor = Arc::clone(&shared.executor);
    define(
        "proc_pending_tasks",
        Value::native("proc_pending_tasks", Some(0), move |_, _| {
            let pending = i32::try_from(executor.pending_tasks()).unwrap_or(i32::MAX);
            Ok(Value::i32(pending))
        }),
    );

    install_channels(interpreter);
    install_mutexes(interpreter);
}

fn install_channels(interpreter: &Interpreter) {
    let shared = &interpreter.shared;
    let define = |name: &str, value: Value| shared.globals.define(Name::new(name), value);

    define(
        "__able_channel_new",
        Value::native("__able_channel_new", Some(1), |_, args| {
            let [capacity] = take("__able_channel_new", args)?;
            let Some(raw) = capacity.underlying().as_integer() else {
                return Err(type_mismatch("integer capacity", capacity.type_name()));
            };
            let capacity = raw
                .to_u128()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    EvalError::new(format!("Channel capacity must be non-negative, got {raw}"))
                })?;
            Ok(Value::Channel(Channel::new(capacity)))
        }),
    );

    let executor = Arc::clone(&shared.executor);
    define(
        "__able_channel_send",
        Value::native("__able_channel_send", Some(2), move |ctx, args| {
            let [channel, value] = take("__able_channel_send", args)?;
            let current = current_task(ctx);
            let Some(channel) = channel_arg(&channel)? else {
                return block_forever(executor.as_ref(), current.as_deref());
            };
            executor.block_on(current.as_deref(), Some(channel.notifier()), &mut || {
                Ok(channel.try_send(value.clone())?.then_some(Value::Void))
            })
        }),
    );

    let executor = Arc::clone(&shared.executor);
    define(
        "__able_channel_receive",
        Value::native("__able_channel_receive", Some(1), move |ctx, args| {
            let [channel] = take("__able_channel_receive", args)?;
            let current = current_task(ctx);
            let Some(channel) = channel_arg(&channel)? else {
                return block_forever(executor.as_ref(), current.as_deref());
            };
            if let Some(value) = received(channel.try_receive()) {
                return Ok(value);
            }
            channel.register_receiver();
            let result = executor.block_on(current.as_deref(), Some(channel.notifier()), &mut || {
                Ok(received(channel.try_receive()))
            });
            channel.unregister_receiver();
            result
        }),
    );

    define(
        "__able_channel_try_send",
        Value::native("__able_channel_try_send", Some(2), |_, args| {
            let [channel, value] = take("__able_channel_try_send", args)?;
            match channel_arg(&channel)? {
                Some(channel) => Ok(Value::Bool(channel.try_send(value)?)),
                None => Ok(Value::Bool(false)),
            }
        }),
    );

    define(
        "__able_channel_try_receive",
        Value::native("__able_channel_try_receive", Some(1), |_, args| {
            let [channel] = take("__able_channel_try_receive", args)?;
            Ok(match channel_arg(&channel)? {
                Some(channel) => received(channel.try_receive()).unwrap_or(Value::Nil),
                None => Value::Nil,
            })
        }),
    );

    define(
        "__able_channel_close",
        Value::native("__able_channel_close", Some(1), |_, args| {
            let [channel] = take("__able_channel_close", args)?;
            match channel_arg(&channel)? {
                Some(channel) => channel.close().map(|()| Value::Void),
                None => Err(EvalError::new("close of nil channel")),
            }
        }),
    );

    define(
        "__able_channel_is_closed",
        Value::native("__able_channel_is_closed", Some(1), |_, args| {
            let [channel] = take("__able_channel_is_closed", args)?;
            Ok(Value::Bool(
                channel_arg(&channel)?.is_some_and(|channel| channel.is_closed()),
            ))
        }),
    );
}

fn install_mutexes(interpreter: &Interpreter) {
    let shared = &interpreter.shared;
    let define = |name: &str, value: Value| shared.globals.define(Name::new(name), value);

    define(
        "__able_mutex_new",
        Value::native("__able_mutex_new", Some(0), |_, _| {
            Ok(Value::Mutex(MutexHandle::new()))
        }),
    );

    let executor = Arc::clone(&shared.executor);
    define(
        "__able_mutex_lock",
        Value::native("__able_mutex_lock", Some(1), move |ctx, args| {
            let [mutex] = take("__able_mutex_lock", args)?;
            let mutex = mutex_arg(&mutex)?;
            let current = current_task(ctx);
            executor.block_on(current.as_deref(), Some(mutex.notifier()), &mut || {
                Ok(mutex.try_lock().then_some(Value::Void))
            })
        }),
    );

    define(
        "__able_mutex_unlock",
        Value::native("__able_mutex_unlock", Some(1), |_, args| {
            let [mutex] = take("__able_mutex_unlock", args)?;
            mutex_arg(&mutex)?.unlock().map(|()| Value::Void)
        }),
    );
}

fn current_task(ctx: &dyn CallContext) -> Option<Arc<AsyncContext>> {
    AsyncContext::from_runtime_data(ctx.env().runtime_data())
}

fn require_task(ctx: &dyn CallContext, primitive: &str) -> Result<Arc<AsyncContext>, EvalError> {
    current_task(ctx).ok_or_else(|| outside_async_task(primitive))
}

/// `Value` for a received element, `Nil` once closed and drained, `None`
/// while empty.
fn received(outcome: ReceiveOutcome) -> Option<Value> {
    match outcome {
        ReceiveOutcome::Value(value) => Some(value),
        ReceiveOutcome::Closed => Some(Value::Nil),
        ReceiveOutcome::Empty => None,
    }
}

/// A nil channel never becomes ready; only cancellation (or the serial
/// executor's deadlock check) ends the wait.
fn block_forever(executor: &dyn Executor, current: Option<&AsyncContext>) -> EvalResult {
    executor.block_on(current, None, &mut || Ok(None))
}

fn channel_arg(value: &Value) -> Result<Option<Channel>, EvalError> {
    match value.underlying() {
        Value::Channel(channel) => Ok(Some(channel.clone())),
        Value::Nil => Ok(None),
        other => Err(type_mismatch("Channel", other.type_name())),
    }
}

fn mutex_arg(value: &Value) -> Result<MutexHandle, EvalError> {
    match value.underlying() {
        Value::Mutex(mutex) => Ok(mutex.clone()),
        other => Err(type_mismatch("Mutex", other.type_name())),
    }
}
