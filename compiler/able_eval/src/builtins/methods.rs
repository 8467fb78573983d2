//! Inherent natives of builtin types.
//!
//! Each native takes its receiver as the first argument, so arities below
//! count it.

use std::sync::Arc;

use able_runtime::errors::{index_out_of_bounds, integer_overflow, type_mismatch};
use able_runtime::iterator::{ArrayIterator, RangeIterator, StringIterator};
use able_runtime::value::ArrayRef;
use able_runtime::{EvalError, EvalResult, TaskHandle, Value};

use super::take;
use crate::concurrency::{await_handle, AsyncContext};
use crate::interpreter::Interpreter;

pub(super) fn install(interpreter: &Interpreter) {
    let shared = &interpreter.shared;
    let mut registry = shared.registry.write();
    let mut add = |type_name: &str, name: &'static str, value: Value| {
        registry.add_inherent(type_name, name, value);
    };

    add("Array", "len", Value::native("len", Some(1), |_, args| {
        let [receiver] = take("len", args)?;
        length(array(&receiver)?.len())
    }));
    add("Array", "push", Value::native("push", Some(2), |_, args| {
        let [receiver, value] = take("push", args)?;
        array(&receiver)?.push(value);
        Ok(Value::Void)
    }));
    add("Array", "pop", Value::native("pop", Some(1), |_, args| {
        let [receiver] = take("pop", args)?;
        Ok(array(&receiver)?.pop().unwrap_or(Value::Nil))
    }));
    add("Array", "get", Value::native("get", Some(2), |_, args| {
        let [receiver, index] = take("get", args)?;
        let items = array(&receiver)?;
        let index = integer_arg(&index)?;
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .unwrap_or(Value::Nil))
    }));
    add("Array", "set", Value::native("set", Some(3), |_, args| {
        let [receiver, index, value] = take("set", args)?;
        let items = array(&receiver)?;
        let raw = integer_arg(&index)?;
        match usize::try_from(raw) {
            Ok(i) if items.set(i, value) => Ok(Value::Void),
            _ => Err(index_out_of_bounds(raw, items.len())),
        }
    }));
    add("Array", "iterator", Value::native("iterator", Some(1), |_, args| {
        let [receiver] = take("iterator", args)?;
        let items = array(&receiver)?.clone();
        Ok(Value::Iterator(Arc::new(ArrayIterator::new(items))))
    }));

    add("String", "len", Value::native("len", Some(1), |_, args| {
        let [receiver] = take("len", args)?;
        length(string(&receiver)?.chars().count())
    }));
    add("String", "iterator", Value::native("iterator", Some(1), |_, args| {
        let [receiver] = take("iterator", args)?;
        Ok(Value::Iterator(Arc::new(StringIterator::new(string(&receiver)?))))
    }));

    add("Range", "iterator", Value::native("iterator", Some(1), |_, args| {
        let [receiver] = take("iterator", args)?;
        match receiver.underlying() {
            Value::Range(range) => Ok(Value::Iterator(Arc::new(RangeIterator::new(range.clone())))),
            other => Err(type_mismatch("Range", other.type_name())),
        }
    }));

    add("Iterator", "next", Value::native("next", Some(1), |ctx, args| {
        let [receiver] = take("next", args)?;
        match receiver.underlying() {
            Value::Iterator(source) => source.next(ctx),
            other => Err(type_mismatch("Iterator", other.type_name())),
        }
    }));
    add("Iterator", "close", Value::native("close", Some(1), |_, args| {
        let [receiver] = take("close", args)?;
        match receiver.underlying() {
            Value::Iterator(source) => {
                source.close();
                Ok(Value::Void)
            }
            other => Err(type_mismatch("Iterator", other.type_name())),
        }
    }));

    for type_name in ["ProcHandle", "Future"] {
        let structs = shared.builtin_structs.clone();
        add(type_name, "status", Value::native("status", Some(1), move |_, args| {
            let [receiver] = take("status", args)?;
            Ok(structs.status_value(&handle(&receiver)?.status()))
        }));

        let executor = Arc::clone(&shared.executor);
        add(type_name, "value", Value::native("value", Some(1), move |ctx, args| {
            let [receiver] = take("value", args)?;
            let handle = handle(&receiver)?;
            let current = AsyncContext::from_runtime_data(ctx.env().runtime_data());
            await_handle(executor.as_ref(), current.as_deref(), &handle)
        }));

        add(type_name, "cancel", Value::native("cancel", Some(1), |_, args| {
            let [receiver] = take("cancel", args)?;
            let handle = handle(&receiver)?;
            if handle.request_cancel() {
                handle.cancel_unstarted();
            }
            Ok(Value::Void)
        }));

        add(type_name, "is_ready", Value::native("is_ready", Some(1), |_, args| {
            let [receiver] = take("is_ready", args)?;
            Ok(Value::Bool(handle(&receiver)?.is_ready()))
        }));
    }
    drop(registry);
    tracing::trace!("inherent natives installed");
}

fn array(value: &Value) -> Result<&ArrayRef, EvalError> {
    match value.underlying() {
        Value::Array(items) => Ok(items),
        other => Err(type_mismatch("Array", other.type_name())),
    }
}

fn string(value: &Value) -> Result<&str, EvalError> {
    value
        .underlying()
        .as_str()
        .ok_or_else(|| type_mismatch("String", value.type_name()))
}

fn handle(value: &Value) -> Result<TaskHandle, EvalError> {
    match value.underlying() {
        Value::Proc(handle) | Value::Future(handle) => Ok(handle.clone()),
        other => Err(type_mismatch("ProcHandle or Future", other.type_name())),
    }
}

fn integer_arg(value: &Value) -> Result<i128, EvalError> {
    value
        .underlying()
        .as_integer()
        .map(|n| n.to_i128().unwrap_or(i128::MAX))
        .ok_or_else(|| type_mismatch("integer index", value.type_name()))
}

fn length(len: usize) -> EvalResult {
    i32::try_from(len)
        .map(Value::i32)
        .map_err(|_| integer_overflow())
}
