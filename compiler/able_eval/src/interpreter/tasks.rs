//! `proc`, `spawn`, and iterator literals.
//!
//! Each runs its body on a fork of the current interpreter: a fresh child
//! scope, the same shared tables, and its own dynamic state.

use std::sync::Arc;

use able_ir::ast::{Expr, IteratorLiteral};
use able_ir::Name;
use able_runtime::value::GeneratorControl;
use able_runtime::{EvalResult, RuntimeData, TaskKind, Value};

use super::Interpreter;
use crate::concurrency::AsyncContext;
use crate::exec::control::{function_result, top_level_result};
use crate::generator::GeneratorIterator;

impl Interpreter {
    /// Schedule `body` on the executor and return its handle.
    pub(crate) fn eval_async(&mut self, body: &Arc<Expr>, kind: TaskKind) -> EvalResult {
        let mut task = self.fork(self.env.child());
        let body = Arc::clone(body);
        let handle = self.shared.executor.spawn(
            kind,
            Box::new(move |context: AsyncContext| {
                let context = Arc::new(context);
                task.env.set_runtime_data(Arc::clone(&context) as RuntimeData);
                task.state.task = Some(context);
                top_level_result(function_result(task.eval_expr(&body)))
            }),
        );
        tracing::trace!(task = handle.id(), kind = kind.label(), "task scheduled");
        Ok(match kind {
            TaskKind::Proc => Value::Proc(handle),
            TaskKind::Future => Value::Future(handle),
        })
    }

    /// `Iterator { gen => ... }`: a lazily started generator.
    pub(crate) fn iterator_literal(&self, lit: &Arc<IteratorLiteral>) -> Value {
        let mut generator = self.fork(self.env.child());
        generator
            .env
            .set_runtime_data(Arc::clone(&self.shared.no_task));
        let lit = Arc::clone(lit);
        let body = Box::new(move |control: Arc<dyn GeneratorControl>| {
            let binding = lit.binding.clone().unwrap_or_else(|| Name::new("gen"));
            generator
                .env
                .define(binding, Value::Generator(Arc::clone(&control)));
            generator.state.generator = Some(control);
            top_level_result(function_result(generator.eval_stmts(&lit.body.stmts)))
        });
        Value::Iterator(Arc::new(GeneratorIterator::new(body, self.shared.stack_size)))
    }
}
