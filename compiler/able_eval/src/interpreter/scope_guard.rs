//! RAII-style guards for interpreter state.
//!
//! [`ScopedInterpreter`] swaps in a scope (and optionally a call frame, a
//! breakpoint label, or a raised value) and restores the previous state
//! when dropped, even during unwinding.
//!
//! # Usage
//!
//! ```text
//! let mut scoped = interpreter.scoped();
//! scoped.env.define(name, value);
//! scoped.eval_expr(body)?;
//! // previous scope restored here
//!
//! let mut call = interpreter.scoped_env(env).with_frame(frame);
//! call.eval_block(body)
//! ```

use std::ops::{Deref, DerefMut};

use able_ir::Name;
use able_runtime::{Environment, Value};

use super::{CallFrame, Interpreter};

/// Guard that restores the interpreter's scope, and whatever else it was
/// asked to manage, on drop.
///
/// Access the interpreter through the guard; it implements `Deref` and
/// `DerefMut`.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
    saved_env: Option<Environment>,
    saved_frame: Option<CallFrame>,
    pushed_label: bool,
    pushed_raise: bool,
}

impl ScopedInterpreter<'_> {
    /// Also replace the call frame until the guard drops.
    #[must_use]
    pub(crate) fn with_frame(mut self, frame: CallFrame) -> Self {
        let previous = std::mem::replace(&mut self.interpreter.frame, frame);
        self.saved_frame.get_or_insert(previous);
        self
    }

    /// Also register a live breakpoint label until the guard drops.
    #[must_use]
    pub fn with_label(mut self, label: Name) -> Self {
        self.interpreter.state.breakpoints.push(label);
        self.pushed_label = true;
        self
    }

    /// Also make `value` the current raise for `rethrow` until the guard
    /// drops.
    #[must_use]
    pub fn with_raise(mut self, value: Value) -> Self {
        self.interpreter.state.raise_stack.push(value);
        self.pushed_raise = true;
        self
    }

    /// Define each binding in the guarded scope.
    pub fn bind_all(&mut self, bindings: impl IntoIterator<Item = (Name, Value)>) {
        for (name, value) in bindings {
            self.interpreter.env.define(name, value);
        }
    }
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        if let Some(env) = self.saved_env.take() {
            self.interpreter.env = env;
        }
        if let Some(frame) = self.saved_frame.take() {
            self.interpreter.frame = frame;
        }
        if self.pushed_label {
            self.interpreter.state.breakpoints.pop();
        }
        if self.pushed_raise {
            self.interpreter.state.raise_stack.pop();
        }
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Evaluate inside a fresh child of the current scope until the guard
    /// drops.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_> {
        let child = self.env.child();
        self.scoped_env(child)
    }

    /// Evaluate inside `env` until the guard drops.
    pub fn scoped_env(&mut self, env: Environment) -> ScopedInterpreter<'_> {
        let saved = std::mem::replace(&mut self.env, env);
        ScopedInterpreter {
            interpreter: self,
            saved_env: Some(saved),
            saved_frame: None,
            pushed_label: false,
            pushed_raise: false,
        }
    }

    /// Guard that keeps the current scope and restores only what it is
    /// asked to manage (`with_label`, `with_raise`, `with_frame`).
    pub fn guarded(&mut self) -> ScopedInterpreter<'_> {
        ScopedInterpreter {
            interpreter: self,
            saved_env: None,
            saved_frame: None,
            pushed_label: false,
            pushed_raise: false,
        }
    }

    /// Run `f` in a fresh child scope holding `bindings`.
    pub fn with_bindings<T>(
        &mut self,
        bindings: impl IntoIterator<Item = (Name, Value)>,
        f: impl FnOnce(&mut ScopedInterpreter<'_>) -> T,
    ) -> T {
        let mut scoped = self.scoped();
        scoped.bind_all(bindings);
        f(&mut scoped)
    }
}
