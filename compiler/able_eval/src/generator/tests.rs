use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use able_runtime::errors::generator_closed;
use able_runtime::{CallContext, Environment, EvalError, EvalErrorKind, EvalResult, Value};
use pretty_assertions::assert_eq;

use super::*;

const STACK: usize = 2 * 1024 * 1024;

/// Generators never call back into the evaluator through the context.
struct NoCalls(Environment);

impl CallContext for NoCalls {
    fn env(&self) -> &Environment {
        &self.0
    }

    fn call(&mut self, _callee: &Value, _args: Vec<Value>) -> EvalResult {
        Err(EvalError::new("unexpected call"))
    }

    fn call_method(&mut self, _receiver: &Value, _method: &str, _args: Vec<Value>) -> EvalResult {
        Err(EvalError::new("unexpected call"))
    }
}

fn ctx() -> NoCalls {
    NoCalls(Environment::new())
}

fn counting(limit: i32) -> GeneratorIterator {
    GeneratorIterator::new(
        Box::new(move |gen| {
            for n in 1..=limit {
                gen.yield_value(Value::i32(n))?;
            }
            Ok(Value::Void)
        }),
        STACK,
    )
}

fn drain(iter: &GeneratorIterator) -> Vec<Value> {
    let mut ctx = ctx();
    let mut out = Vec::new();
    loop {
        match iter.next(&mut ctx).unwrap() {
            Value::IteratorEnd => return out,
            value => out.push(value),
        }
    }
}

#[test]
fn yields_values_in_order_then_ends() {
    let iter = counting(3);
    assert_eq!(drain(&iter), vec![Value::i32(1), Value::i32(2), Value::i32(3)]);
    assert_eq!(iter.next(&mut ctx()).unwrap(), Value::IteratorEnd);
}

#[test]
fn body_does_not_start_before_first_next() {
    let started = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&started);
    let iter = GeneratorIterator::new(
        Box::new(move |gen| {
            flag.store(true, Ordering::SeqCst);
            gen.yield_value(Value::i32(1))?;
            Ok(Value::Void)
        }),
        STACK,
    );
    assert!(!started.load(Ordering::SeqCst));
    assert_eq!(iter.next(&mut ctx()).unwrap(), Value::i32(1));
    assert!(started.load(Ordering::SeqCst));
}

#[test]
fn close_unwinds_suspended_body() {
    let unwound = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&unwound);
    let iter = GeneratorIterator::new(
        Box::new(move |gen| {
            let result = gen.yield_value(Value::i32(1));
            flag.store(true, Ordering::SeqCst);
            result?;
            gen.yield_value(Value::i32(2))?;
            Ok(Value::Void)
        }),
        STACK,
    );
    assert_eq!(iter.next(&mut ctx()).unwrap(), Value::i32(1));
    iter.close();
    assert!(unwound.load(Ordering::SeqCst));
    assert_eq!(iter.next(&mut ctx()).unwrap(), Value::IteratorEnd);
}

#[test]
fn close_before_start_never_runs_body() {
    let started = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&started);
    let iter = GeneratorIterator::new(
        Box::new(move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(Value::Void)
        }),
        STACK,
    );
    iter.close();
    assert_eq!(iter.next(&mut ctx()).unwrap(), Value::IteratorEnd);
    assert!(!started.load(Ordering::SeqCst));
}

#[test]
fn error_is_reported_once_then_done() {
    let iter = GeneratorIterator::new(
        Box::new(|gen| {
            gen.yield_value(Value::i32(1))?;
            Err(EvalError::raise(Value::error("broken")))
        }),
        STACK,
    );
    let mut ctx = ctx();
    assert_eq!(iter.next(&mut ctx).unwrap(), Value::i32(1));
    let err = iter.next(&mut ctx).unwrap_err();
    assert_eq!(err.message, "broken");
    assert_eq!(iter.next(&mut ctx).unwrap(), Value::IteratorEnd);
}

#[test]
fn stop_ends_sequence_without_error() {
    let iter = GeneratorIterator::new(
        Box::new(|gen| {
            gen.yield_value(Value::i32(1))?;
            gen.stop();
            Err(generator_closed())
        }),
        STACK,
    );
    assert_eq!(drain(&iter), vec![Value::i32(1)]);
}

#[test]
fn yield_after_stop_is_an_error() {
    let iter = GeneratorIterator::new(
        Box::new(|gen| {
            gen.stop();
            gen.yield_value(Value::i32(1))?;
            Ok(Value::Void)
        }),
        STACK,
    );
    let err = iter.next(&mut ctx()).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::YieldAfterClose);
    assert_eq!(err.message, "Cannot yield from a closed iterator");
}

#[test]
fn return_signal_finishes_normally() {
    let iter = GeneratorIterator::new(
        Box::new(|gen| {
            gen.yield_value(Value::string("only"))?;
            Err(EvalError::return_with(Value::Nil))
        }),
        STACK,
    );
    assert_eq!(drain(&iter), vec![Value::string("only")]);
}

#[test]
fn busy_flag_rejects_reentry() {
    let iter = counting(1);
    iter.busy.store(true, Ordering::SeqCst);
    let err = iter.next(&mut ctx()).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::IteratorReentered);
    iter.busy.store(false, Ordering::SeqCst);
    assert_eq!(iter.next(&mut ctx()).unwrap(), Value::i32(1));
}

#[test]
fn body_can_close_its_own_iterator() {
    let slot: Arc<parking_lot::Mutex<Option<Arc<GeneratorIterator>>>> =
        Arc::new(parking_lot::Mutex::new(None));
    let own = Arc::clone(&slot);
    let iter = Arc::new(GeneratorIterator::new(
        Box::new(move |gen| {
            gen.yield_value(Value::i32(1))?;
            let this = own.lock().take().unwrap();
            this.close();
            gen.yield_value(Value::i32(2))?;
            Ok(Value::Void)
        }),
        STACK,
    ));
    *slot.lock() = Some(Arc::clone(&iter));

    let mut ctx = ctx();
    assert_eq!(iter.next(&mut ctx).unwrap(), Value::i32(1));
    assert_eq!(iter.next(&mut ctx).unwrap(), Value::IteratorEnd);
    assert_eq!(iter.next(&mut ctx).unwrap(), Value::IteratorEnd);
}

#[test]
fn close_from_another_thread_while_a_step_runs() {
    let (entered_tx, entered_rx) = crossbeam::channel::bounded::<()>(0);
    let (release_tx, release_rx) = crossbeam::channel::bounded::<()>(0);
    let iter = Arc::new(GeneratorIterator::new(
        Box::new(move |gen| {
            let _ = entered_tx.send(());
            let _ = release_rx.recv();
            gen.yield_value(Value::i32(1))?;
            Ok(Value::Void)
        }),
        STACK,
    ));

    let consumer = {
        let iter = Arc::clone(&iter);
        std::thread::spawn(move || iter.next(&mut ctx()).unwrap())
    };
    entered_rx.recv().unwrap();
    iter.close();
    release_tx.send(()).unwrap();
    assert_eq!(consumer.join().unwrap(), Value::IteratorEnd);
}
