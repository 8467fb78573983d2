//! Globals and inherent natives installed into every interpreter.
//!
//! - `print` and the builtin status structs
//! - the proc primitives, channels, and mutexes (`concurrency`)
//! - inherent methods of arrays, strings, ranges, iterators, and task
//!   handles (`methods`)
//!
//! Natives capture the shared pieces they need (executor, status structs,
//! print handler) rather than the interpreter, so they can be called from
//! any fork.

mod concurrency;
mod methods;

use std::sync::Arc;

use able_ir::ast::{StructDefinition, StructFieldDefinition, StructKind, TypeExpr};
use able_ir::Name;
use able_runtime::errors::arity_mismatch;
use able_runtime::value::{StructFields, StructInstance};
use able_runtime::{EvalError, TaskStatus, Value};

use crate::interpreter::Interpreter;

/// Definitions of the structs `status()` returns.
pub(crate) struct BuiltinStructs {
    pub pending: Arc<StructDefinition>,
    pub resolved: Arc<StructDefinition>,
    pub cancelled: Arc<StructDefinition>,
    pub failed: Arc<StructDefinition>,
    pub proc_error: Arc<StructDefinition>,
}

impl BuiltinStructs {
    pub fn new() -> Self {
        BuiltinStructs {
            pending: singleton("Pending"),
            resolved: singleton("Resolved"),
            cancelled: singleton("Cancelled"),
            failed: with_field("Failed", "error", "ProcError"),
            proc_error: with_field("ProcError", "details", "String"),
        }
    }

    pub fn all(&self) -> [&Arc<StructDefinition>; 5] {
        [
            &self.pending,
            &self.resolved,
            &self.cancelled,
            &self.failed,
            &self.proc_error,
        ]
    }

    /// Status struct for a handle's current state.
    pub fn status_value(&self, status: &TaskStatus) -> Value {
        let empty = |def: &Arc<StructDefinition>| {
            Value::struct_instance(StructInstance::new(
                Arc::clone(def),
                StructFields::Named(Vec::new()),
                Vec::new(),
            ))
        };
        match status {
            TaskStatus::Pending => empty(&self.pending),
            TaskStatus::Resolved(_) => empty(&self.resolved),
            TaskStatus::Cancelled(_) => empty(&self.cancelled),
            TaskStatus::Failed(failure) => Value::struct_instance(StructInstance::new(
                Arc::clone(&self.failed),
                StructFields::Named(vec![(Name::new("error"), failure.clone())]),
                Vec::new(),
            )),
        }
    }
}

fn singleton(name: &str) -> Arc<StructDefinition> {
    Arc::new(StructDefinition {
        name: Name::new(name),
        generic_params: Vec::new(),
        kind: StructKind::Singleton,
        fields: Vec::new(),
        where_clause: Vec::new(),
        is_private: false,
    })
}

fn with_field(name: &str, field: &str, ty: &str) -> Arc<StructDefinition> {
    Arc::new(StructDefinition {
        name: Name::new(name),
        generic_params: Vec::new(),
        kind: StructKind::Named,
        fields: vec![StructFieldDefinition {
            name: Some(Name::new(field)),
            ty: TypeExpr::simple(ty),
        }],
        where_clause: Vec::new(),
        is_private: false,
    })
}

/// Register inherent natives. Always done, whatever the builder says.
pub(crate) fn install_methods(interpreter: &Interpreter) {
    methods::install(interpreter);
}

/// Define `print`, the status structs, and the concurrency primitives in
/// the global scope.
pub(crate) fn install_globals(interpreter: &Interpreter) {
    let shared = &interpreter.shared;
    {
        let mut registry = shared.registry.write();
        for def in shared.builtin_structs.all() {
            registry.register_struct(Arc::clone(def));
            shared
                .globals
                .define(def.name.clone(), Value::StructDefinition(Arc::clone(def)));
        }
    }

    let handler = shared.print_handler.clone();
    shared.globals.define(
        Name::new("print"),
        Value::native("print", Some(1), move |_, args| {
            let [value] = take("print", args)?;
            handler.println(&value.to_string());
            Ok(Value::Void)
        }),
    );

    concurrency::install(interpreter);
    tracing::debug!("builtin globals installed");
}

/// Destructure exactly `N` arguments.
pub(crate) fn take<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], EvalError> {
    let got = args.len();
    args.try_into().map_err(|_| arity_mismatch(name, N, got))
}
