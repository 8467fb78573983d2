//! Expression and statement dispatch.

use std::sync::Arc;

use able_ir::ast::{
    AssignOp, AssignTarget, BinaryOp, Block, Expr, ExprKind, MatchClause, MemberName, OrClause,
    Pattern, Stmt, StructKind, TypeExpr,
};
use able_ir::{Name, Span};
use able_runtime::errors::{
    implicit_member_outside_method, logical_requires_bool, no_field_or_method,
    non_exhaustive_match, placeholder_outside_lambda, rethrow_outside_rescue,
    unknown_break_label, unknown_continue_label, yield_outside_iterator,
};
use able_runtime::iterator::{ArrayIterator, RangeIterator, StringIterator};
use able_runtime::value::{
    ArgSlot, FunctionDecl, FunctionValue, PartialFunction, StructFields, StructInstance,
};
use able_runtime::{EvalError, EvalResult, IteratorRef, TaskKind, Value};

use super::Interpreter;
use crate::exec::control::{breakpoint_action, loop_action, BreakpointAction, LoopAction};
use crate::exec::expr::{array_index, interpolate, literal_value, make_range, raise_value};
use crate::exec::pattern::{match_pattern, Mismatch, PatternBindings};
use crate::exec::placeholder::{is_lambda_root, is_partial_call, marker, placeholder_arity};
use crate::operators::evaluate_binary;
use crate::unary_operators::evaluate_unary;

/// Headroom each nested expression needs before the stack is grown.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of a fresh segment once the headroom runs out.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

impl Interpreter {
    /// Evaluate an expression, growing the stack for deeply nested trees.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.eval_expr_inner(expr))
            .map_err(|err| locate(err, expr.span))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult {
        if self.frame.placeholder.is_none() && is_lambda_root(expr) {
            return Ok(self.placeholder_lambda(expr));
        }
        match &expr.kind {
            ExprKind::Literal(lit) => literal_value(lit),
            ExprKind::Identifier(name) => self.eval_identifier(name),
            ExprKind::Array(items) => Ok(Value::array(self.eval_all(items)?)),
            ExprKind::Interpolation(parts) => Ok(interpolate(&self.eval_all(parts)?)),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                evaluate_unary(value.underlying(), *op)
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right),
            ExprKind::Call {
                callee,
                args,
                type_args,
            } => self.eval_call(callee, args, type_args),
            ExprKind::Block(block) => self.eval_block(block),
            ExprKind::Assignment { op, target, value } => self.eval_assignment(*op, target, value),
            ExprKind::Range {
                start,
                end,
                inclusive,
            } => {
                let start = self.eval_expr(start)?;
                let end = self.eval_expr(end)?;
                make_range(start.underlying(), end.underlying(), *inclusive)
            }
            ExprKind::Member {
                object,
                member,
                safe,
            } => {
                let object = self.eval_expr(object)?;
                if *safe && object.is_nil() {
                    return Ok(Value::Nil);
                }
                self.member_value(&object, member)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                self.index_value(&object, &index)
            }
            ExprKind::Lambda(lambda) => Ok(Value::function(
                FunctionValue::new(FunctionDecl::Lambda(Arc::clone(lambda)), self.env.clone())
                    .with_package(self.frame.package.clone()),
            )),
            ExprKind::Proc(body) => self.eval_async(body, TaskKind::Proc),
            ExprKind::Spawn(body) => self.eval_async(body, TaskKind::Future),
            ExprKind::Propagation(inner) => {
                let value = self.eval_expr(inner)?;
                match value.underlying() {
                    Value::Error(_) => Err(EvalError::raise(value.underlying().clone())),
                    _ => Ok(value),
                }
            }
            ExprKind::OrElse {
                expr,
                handler,
                binding,
            } => self.eval_or_else(expr, handler, binding.as_ref()),
            ExprKind::Breakpoint { label, body } => self.eval_breakpoint(label, body),
            ExprKind::If {
                condition,
                body,
                or_clauses,
            } => self.eval_if(condition, body, or_clauses),
            ExprKind::Match { subject, clauses } => {
                let subject = self.eval_expr(subject)?;
                for clause in clauses {
                    if let Some(value) = self.run_clause(clause, &subject, false)? {
                        return Ok(value);
                    }
                }
                Err(non_exhaustive_match())
            }
            ExprKind::Rescue { monitored, clauses } => self.eval_rescue(monitored, clauses),
            ExprKind::Ensure { body, ensure } => {
                let result = self.eval_expr(body);
                self.eval_block(ensure)?;
                result
            }
            ExprKind::Iterator(lit) => Ok(self.iterator_literal(lit)),
            ExprKind::ImplicitMember(name) => {
                let Some(receiver) = self.frame.receiver.clone() else {
                    return Err(implicit_member_outside_method());
                };
                self.member_value(&receiver, &MemberName::Named(name.clone()))
            }
            ExprKind::Placeholder(index) => match self.frame.placeholder.as_mut() {
                Some(frame) => frame.value_for(*index),
                None => Err(placeholder_outside_lambda()),
            },
            ExprKind::StructLiteral(lit) => self.eval_struct_literal(lit),
            ExprKind::Loop(body) => loop {
                match loop_action(self.eval_block(body)) {
                    LoopAction::Next => {}
                    LoopAction::Exit(value) => return Ok(value),
                    LoopAction::Propagate(err) => return Err(err),
                }
            },
        }
    }

    /// Evaluate a block in a fresh child scope.
    pub fn eval_block(&mut self, block: &Block) -> EvalResult {
        let mut scoped = self.scoped();
        scoped.eval_stmts(&block.stmts)
    }

    /// Evaluate statements in the current scope; the value of the last
    /// one, or nil.
    pub(crate) fn eval_stmts(&mut self, stmts: &[Stmt]) -> EvalResult {
        let mut last = Value::Nil;
        for stmt in stmts {
            last = self.eval_stmt(stmt)?;
        }
        Ok(last)
    }

    pub(crate) fn eval_stmt(&mut self, stmt: &Stmt) -> EvalResult {
        match stmt {
            Stmt::Expr(expr) => self.eval_expr(expr),
            Stmt::While { condition, body } => {
                while self.eval_expr(condition)?.is_truthy() {
                    match loop_action(self.eval_block(body)) {
                        LoopAction::Next => {}
                        LoopAction::Exit(_) => break,
                        LoopAction::Propagate(err) => return Err(err),
                    }
                }
                Ok(Value::Nil)
            }
            Stmt::For {
                pattern,
                iterable,
                body,
            } => self.eval_for(pattern, iterable, body),
            Stmt::Break { label, value } => {
                if let Some(label) = label {
                    if !self.state.breakpoints.contains(label) {
                        return Err(unknown_break_label(label.as_str()));
                    }
                }
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Nil,
                };
                Err(EvalError::break_with(label.clone(), value))
            }
            Stmt::Continue { label } => {
                if let Some(label) = label {
                    if !self.state.breakpoints.contains(label) {
                        return Err(unknown_continue_label(label.as_str()));
                    }
                }
                Err(EvalError::continue_signal(label.clone()))
            }
            Stmt::Raise(expr) => {
                let value = self.eval_expr(expr)?;
                Err(EvalError::raise(raise_value(value.underlying().clone())))
            }
            Stmt::Rethrow => match self.state.raise_stack.last() {
                Some(value) => Err(EvalError::raise(value.clone())),
                None => Err(rethrow_outside_rescue()),
            },
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Void,
                };
                Err(EvalError::return_with(value))
            }
            Stmt::Yield(value) => {
                let Some(generator) = self.state.generator.clone() else {
                    return Err(yield_outside_iterator());
                };
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Nil,
                };
                generator.yield_value(value)?;
                Ok(Value::Nil)
            }
            Stmt::Struct(def) => self.define_struct(def),
            Stmt::Union(def) => self.define_union(def),
            Stmt::Interface(def) => self.define_interface(def),
            Stmt::Impl(def) => self.define_impl(def),
            Stmt::Methods(def) => self.define_methods(def),
            Stmt::Function(def) => self.define_function(def),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|expr| self.eval_expr(expr)).collect()
    }

    fn eval_identifier(&mut self, name: &Name) -> EvalResult {
        let value = self.env.get(name.as_str())?;
        if let Value::StructDefinition(def) = &value {
            if def.kind == StructKind::Singleton {
                return Ok(Value::struct_instance(StructInstance::new(
                    Arc::clone(def),
                    StructFields::Named(Vec::new()),
                    Vec::new(),
                )));
            }
        }
        Ok(value)
    }

    fn placeholder_lambda(&self, body: &Expr) -> Value {
        let decl = FunctionDecl::Placeholder {
            body: Arc::new(body.clone()),
            arity: placeholder_arity(body),
        };
        Value::function(
            FunctionValue::new(decl, self.env.clone()).with_package(self.frame.package.clone()),
        )
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let lhs = self.eval_bool_operand(op, left)?;
            let short_circuit = match op {
                BinaryOp::And => !lhs,
                _ => lhs,
            };
            if short_circuit {
                return Ok(Value::Bool(lhs));
            }
            return self.eval_bool_operand(op, right).map(Value::Bool);
        }
        let lhs = self.eval_expr(left)?;
        let rhs = self.eval_expr(right)?;
        evaluate_binary(lhs.underlying(), rhs.underlying(), op)
    }

    fn eval_bool_operand(&mut self, op: BinaryOp, operand: &Expr) -> Result<bool, EvalError> {
        self.eval_expr(operand)?
            .underlying()
            .as_bool()
            .ok_or_else(|| logical_requires_bool(op.as_symbol()))
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], type_args: &[TypeExpr]) -> EvalResult {
        let target = self.eval_expr(callee)?;
        if target.is_nil() && matches!(callee.kind, ExprKind::Member { safe: true, .. }) {
            return Ok(Value::Nil);
        }
        if self.frame.placeholder.is_none() && is_partial_call(args) {
            let mut slots = Vec::with_capacity(args.len());
            for arg in args {
                slots.push(match marker(arg) {
                    Some(index) => ArgSlot::Hole(index),
                    None => ArgSlot::Bound(self.eval_expr(arg)?),
                });
            }
            return Ok(Value::Partial(Arc::new(PartialFunction { target, slots })));
        }
        let args = self.eval_all(args)?;
        self.call_with_type_args(&target, args, type_args)
    }

    fn eval_if(&mut self, condition: &Expr, body: &Block, or_clauses: &[OrClause]) -> EvalResult {
        if self.eval_expr(condition)?.is_truthy() {
            return self.eval_block(body);
        }
        for clause in or_clauses {
            let taken = match &clause.condition {
                Some(condition) => self.eval_expr(condition)?.is_truthy(),
                None => true,
            };
            if taken {
                return self.eval_block(&clause.body);
            }
        }
        Ok(Value::Nil)
    }

    fn eval_breakpoint(&mut self, label: &Name, body: &Block) -> EvalResult {
        let mut guarded = self.guarded().with_label(label.clone());
        loop {
            match breakpoint_action(label, guarded.eval_block(body)) {
                BreakpointAction::Done(value) => return Ok(value),
                BreakpointAction::Rerun => {}
                BreakpointAction::Propagate(err) => return Err(err),
            }
        }
    }

    fn eval_rescue(&mut self, monitored: &Expr, clauses: &[MatchClause]) -> EvalResult {
        let err = match self.eval_expr(monitored) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let Some(raised) = err.raised_value().cloned() else {
            return Err(err);
        };
        for clause in clauses {
            if let Some(value) = self.run_clause(clause, &raised, true)? {
                return Ok(value);
            }
        }
        Err(err)
    }

    /// Run `clause` if its pattern matches `subject` and its guard holds.
    fn run_clause(
        &mut self,
        clause: &MatchClause,
        subject: &Value,
        rescuing: bool,
    ) -> Result<Option<Value>, EvalError> {
        let Ok(bindings) = self.try_match(&clause.pattern, subject) else {
            return Ok(None);
        };
        let mut scoped = self.scoped();
        if rescuing {
            scoped = scoped.with_raise(subject.clone());
        }
        scoped.bind_all(bindings);
        if let Some(guard) = &clause.guard {
            if !scoped.eval_expr(guard)?.is_truthy() {
                return Ok(None);
            }
        }
        scoped.eval_expr(&clause.body).map(Some)
    }

    fn eval_or_else(&mut self, expr: &Expr, handler: &Block, binding: Option<&Name>) -> EvalResult {
        let (failure, raised) = match self.eval_expr(expr) {
            Ok(Value::Nil) => (None, false),
            Ok(value) if matches!(value.underlying(), Value::Error(_)) => (Some(value), false),
            Ok(value) => return Ok(value),
            Err(err) => match err.raised_value() {
                Some(value) => (Some(value.clone()), true),
                None => return Err(err),
            },
        };
        let mut scoped = self.scoped();
        if let Some(value) = failure {
            if raised {
                scoped = scoped.with_raise(value.clone());
            }
            if let Some(name) = binding {
                scoped.env.define(name.clone(), value);
            }
        }
        scoped.eval_stmts(&handler.stmts)
    }

    fn eval_for(&mut self, pattern: &Pattern, iterable: &Expr, body: &Block) -> EvalResult {
        let source = self.eval_expr(iterable)?;
        let iterator = self.iterator_for(&source)?;
        let result = self.drive_for(pattern, &iterator, body);
        iterator.close();
        result
    }

    fn drive_for(&mut self, pattern: &Pattern, iterator: &IteratorRef, body: &Block) -> EvalResult {
        loop {
            let item = iterator.next(self)?;
            if matches!(item, Value::IteratorEnd) {
                return Ok(Value::Nil);
            }
            let bindings = self.destructure(pattern, &item)?;
            let outcome = self.with_bindings(bindings, |scoped| scoped.eval_stmts(&body.stmts));
            match loop_action(outcome) {
                LoopAction::Next => {}
                LoopAction::Exit(_) => return Ok(Value::Nil),
                LoopAction::Propagate(err) => return Err(err),
            }
        }
    }

    /// An iterator over `value`: arrays, ranges, strings, and iterators
    /// directly, anything else through its `iterator()` method.
    pub(crate) fn iterator_for(&mut self, value: &Value) -> Result<IteratorRef, EvalError> {
        match value.underlying() {
            Value::Array(items) => Ok(Arc::new(ArrayIterator::new(items.clone()))),
            Value::Range(range) => Ok(Arc::new(RangeIterator::new(range.clone()))),
            Value::String(text) => Ok(Arc::new(StringIterator::new(text))),
            Value::Iterator(iterator) => Ok(Arc::clone(iterator)),
            Value::Struct(_) | Value::Interface(_) => {
                match self.invoke_method(value, "iterator", Vec::new())? {
                    Value::Iterator(iterator) => Ok(iterator),
                    other => Err(EvalError::new(format!(
                        "iterator() returned {} instead of an Iterator",
                        other.type_name()
                    ))),
                }
            }
            other => Err(EvalError::new(format!("{} is not iterable", other.type_name()))),
        }
    }

    // Assignment

    fn eval_assignment(&mut self, op: AssignOp, target: &AssignTarget, value: &Expr) -> EvalResult {
        match target {
            AssignTarget::Pattern(pattern) => {
                let value = self.eval_expr(value)?;
                match op {
                    AssignOp::Declare => {
                        let bindings = self.destructure(pattern, &value)?;
                        for (name, bound) in bindings {
                            self.env.define(name, bound);
                        }
                        Ok(value)
                    }
                    AssignOp::Assign => {
                        let bindings = self.destructure(pattern, &value)?;
                        self.env.assign_all(bindings)?;
                        Ok(value)
                    }
                    AssignOp::Compound(bin) => {
                        let Pattern::Identifier(name) = pattern else {
                            return Err(EvalError::new(
                                "Compound assignment requires a simple target",
                            ));
                        };
                        let current = self.env.get(name.as_str())?;
                        let updated = evaluate_binary(current.underlying(), value.underlying(), bin)?;
                        self.env.assign(name.as_str(), updated.clone())?;
                        Ok(updated)
                    }
                }
            }
            AssignTarget::Member { object, member } => {
                let object = self.eval_expr(object)?;
                let mut value = self.eval_expr(value)?;
                if let AssignOp::Compound(bin) = op {
                    let current = self.member_value(&object, member)?;
                    value = evaluate_binary(current.underlying(), value.underlying(), bin)?;
                }
                self.set_member(&object, member, value.clone())?;
                Ok(value)
            }
            AssignTarget::Index { object, index } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                let mut value = self.eval_expr(value)?;
                if let AssignOp::Compound(bin) = op {
                    let current = self.index_value(&object, &index)?;
                    value = evaluate_binary(current.underlying(), value.underlying(), bin)?;
                }
                self.set_index(&object, &index, value.clone())?;
                Ok(value)
            }
        }
    }

    fn set_member(&self, object: &Value, member: &MemberName, value: Value) -> Result<(), EvalError> {
        let Value::Struct(instance) = object.underlying() else {
            return Err(EvalError::new(format!(
                "Cannot assign member '{member}' on {}",
                object.type_name()
            )));
        };
        let stored = match member {
            MemberName::Named(name) => instance.set_field(name.as_str(), value),
            MemberName::Positional(index) => instance.set_positional(*index, value),
        };
        if stored {
            Ok(())
        } else {
            Err(no_field_or_method(
                &member.to_string(),
                instance.definition.name.as_str(),
            ))
        }
    }

    /// `object[index]`: arrays directly, anything else through `get`.
    pub(crate) fn index_value(&mut self, object: &Value, index: &Value) -> EvalResult {
        match object.underlying() {
            Value::Array(items) => {
                let position = array_index(items, index.underlying())?;
                Ok(items.get(position).unwrap_or(Value::Nil))
            }
            _ => self.invoke_method(object, "get", vec![index.clone()]),
        }
    }

    fn set_index(&mut self, object: &Value, index: &Value, value: Value) -> Result<(), EvalError> {
        match object.underlying() {
            Value::Array(items) => {
                let position = array_index(items, index.underlying())?;
                items.set(position, value);
                Ok(())
            }
            _ => self
                .invoke_method(object, "set", vec![index.clone(), value])
                .map(|_| ()),
        }
    }

    // Patterns

    pub(crate) fn try_match(
        &self,
        pattern: &Pattern,
        value: &Value,
    ) -> Result<PatternBindings, Mismatch> {
        match_pattern(&self.shared.registry.read(), pattern, value)
    }

    /// Destructure where a mismatch is an error.
    pub(crate) fn destructure(
        &self,
        pattern: &Pattern,
        value: &Value,
    ) -> Result<PatternBindings, EvalError> {
        self.try_match(pattern, value).map_err(EvalError::from)
    }
}

/// Attach the span of the failing expression to genuine errors.
fn locate(err: EvalError, span: Span) -> EvalError {
    if err.signal.is_some() || span == Span::DUMMY {
        err
    } else {
        err.with_span(span)
    }
}
