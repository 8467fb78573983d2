//! Lexical scope chain.
//!
//! Each scope owns its bindings and a reference to its parent. Blocks,
//! calls, and loop iterations create child scopes; a scope lives as long as
//! some closure or evaluation frame holds it.
//!
//! Scopes are shared across threads (a proc body captures its defining
//! scope), so bindings sit behind a `parking_lot::RwLock`. That lock only
//! keeps the map itself consistent. Programs that mutate shared bindings
//! from concurrent tasks coordinate through the mutex primitive.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use able_ir::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{undefined_variable, EvalError};
use crate::value::Value;

/// Opaque per-scope data, used to thread async context through calls.
pub type RuntimeData = Arc<dyn Any + Send + Sync>;

/// Error returned by `Environment::get` and `Environment::assign`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    #[error("Undefined variable '{0}'")]
    Undefined(Name),
}

impl From<EnvError> for EvalError {
    fn from(err: EnvError) -> Self {
        match err {
            EnvError::Undefined(name) => undefined_variable(name.as_str()),
        }
    }
}

struct Scope {
    bindings: RwLock<FxHashMap<Name, Value>>,
    parent: Option<Environment>,
    runtime_data: RwLock<Option<RuntimeData>>,
}

/// Handle to a scope. Cloning shares the scope.
#[derive(Clone)]
pub struct Environment(Arc<Scope>);

impl Environment {
    /// A root scope with no parent.
    pub fn new() -> Self {
        Environment(Arc::new(Scope {
            bindings: RwLock::new(FxHashMap::default()),
            parent: None,
            runtime_data: RwLock::new(None),
        }))
    }

    /// A fresh scope whose parent is `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Environment(Arc::new(Scope {
            bindings: RwLock::new(FxHashMap::default()),
            parent: Some(self.clone()),
            runtime_data: RwLock::new(None),
        }))
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: impl Into<Name>, value: Value) {
        self.0.bindings.write().insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.0.bindings.read().get(name) {
                return Some(value.clone());
            }
            scope = scope.0.parent.as_ref()?;
        }
    }

    pub fn get(&self, name: &str) -> Result<Value, EnvError> {
        self.lookup(name)
            .ok_or_else(|| EnvError::Undefined(Name::new(name)))
    }

    /// Rebind the nearest existing binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EnvError> {
        let mut scope = self;
        loop {
            {
                let mut bindings = scope.0.bindings.write();
                if let Some(slot) = bindings.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
            }
            match scope.0.parent.as_ref() {
                Some(parent) => scope = parent,
                None => return Err(EnvError::Undefined(Name::new(name))),
            }
        }
    }

    /// Rebind several names; nothing changes unless every name is bound.
    pub fn assign_all(&self, bindings: Vec<(Name, Value)>) -> Result<(), EnvError> {
        if let Some((name, _)) = bindings.iter().find(|(name, _)| !self.has(name.as_str())) {
            return Err(EnvError::Undefined(name.clone()));
        }
        for (name, value) in bindings {
            self.assign(name.as_str(), value)?;
        }
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.0.bindings.read().contains_key(name)
    }

    pub fn set_runtime_data(&self, data: RuntimeData) {
        *self.0.runtime_data.write() = Some(data);
    }

    /// Runtime data of the nearest scope that carries any.
    pub fn runtime_data(&self) -> Option<RuntimeData> {
        let mut scope = self;
        loop {
            if let Some(data) = scope.0.runtime_data.read().as_ref() {
                return Some(Arc::clone(data));
            }
            scope = scope.0.parent.as_ref()?;
        }
    }

    /// Bindings of this scope only, sorted by name.
    pub fn local_bindings(&self) -> Vec<(Name, Value)> {
        let mut out: Vec<_> = self
            .0
            .bindings
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        out.sort_by(|(a, _), (b, _)| a.cmp(b));
        out
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.0.bindings.read().len())
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
