//! Calling convention for host functions.

use crate::environment::Environment;
use crate::errors::EvalResult;
use crate::value::Value;

/// What a native function sees of the interpreter that called it.
///
/// Async state travels in the environment's runtime data slot, so natives
/// that need it (`proc_yield`, blocking channel operations) read
/// `env().runtime_data()`.
pub trait CallContext {
    /// Environment of the call site.
    fn env(&self) -> &Environment;

    /// Call any callable value.
    fn call(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult;

    /// Resolve and call `receiver.method(args...)`.
    fn call_method(&mut self, receiver: &Value, method: &str, args: Vec<Value>) -> EvalResult;
}
