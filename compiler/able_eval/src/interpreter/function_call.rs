//! Function call evaluation methods for the Interpreter.

use std::sync::Arc;

use able_ir::ast::{Parameter, TypeExpr};
use able_ir::Name;
use able_runtime::errors::{arity_mismatch, not_callable, type_argument_count_mismatch};
use able_runtime::value::{FunctionDecl, FunctionValue, PartialFunction};
use able_runtime::{EvalError, EvalResult, Value};

use super::{CallFrame, Interpreter};
use crate::exec::control::function_result;
use crate::exec::placeholder::PlaceholderFrame;
use crate::resolver::types::{substitute, template_score, uses_generics};
use crate::resolver::{collect_constraints, match_template, runtime_type, Bindings, TypeRegistry};

const SELF_TYPE: &str = "Self";

impl Interpreter {
    /// Call any callable value.
    #[tracing::instrument(level = "debug", skip_all, fields(callee = callee.type_name()))]
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        self.call_with_type_args(callee, args, &[])
    }

    /// Call with explicit type arguments (`f<i32>(x)`).
    pub(crate) fn call_with_type_args(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        type_args: &[TypeExpr],
    ) -> EvalResult {
        match callee {
            Value::Native(native) => {
                if let Some(expected) = native.arity {
                    if expected != args.len() {
                        return Err(arity_mismatch(native.name.as_str(), expected, args.len()));
                    }
                }
                native.invoke(self, args)
            }
            Value::Function(func) => self.call_function(func, args, type_args),
            Value::FunctionOverload(overloads) => {
                let chosen = self.select_overload(overloads, &args)?;
                self.call_function(&chosen, args, type_args)
            }
            Value::BoundMethod(bound) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(bound.receiver.clone());
                full.extend(args);
                self.call_with_type_args(&bound.method, full, type_args)
            }
            Value::Partial(partial) => self.call_partial(partial, &args),
            Value::DynRef(dyn_ref) => {
                let target = self.resolve_dyn_ref(dyn_ref)?;
                self.call_with_type_args(&target, args, type_args)
            }
            Value::StructDefinition(def) => self.construct_positional(def, args),
            Value::Interface(iface) => {
                self.call_with_type_args(&iface.underlying, args, type_args)
            }
            other => Err(not_callable(other.type_name())),
        }
    }

    fn call_partial(&mut self, partial: &PartialFunction, args: &[Value]) -> EvalResult {
        let expected = partial.arity();
        if args.len() != expected {
            return Err(arity_mismatch("<partial>", expected, args.len()));
        }
        let filled = partial
            .fill(args)
            .ok_or_else(|| arity_mismatch("<partial>", expected, args.len()))?;
        self.call_value(&partial.target, filled)
    }

    fn call_function(
        &mut self,
        func: &Arc<FunctionValue>,
        args: Vec<Value>,
        type_args: &[TypeExpr],
    ) -> EvalResult {
        let expected = func.decl.arity();
        if args.len() != expected {
            return Err(arity_mismatch(func.name(), expected, args.len()));
        }
        self.check_generics(func, &args, type_args)?;
        let self_type = self_binding(&func.decl, &args);

        let env = func.closure.child();
        env.set_runtime_data(self.runtime_data());
        // A call without arguments keeps the caller's implicit receiver.
        let receiver = args.first().cloned().or_else(|| self.frame.receiver.clone());
        let frame = CallFrame {
            receiver,
            package: func.package.clone(),
            placeholder: None,
        };

        match &func.decl {
            FunctionDecl::Placeholder { body, .. } => {
                let frame = CallFrame {
                    placeholder: Some(PlaceholderFrame::new(body, args)),
                    ..frame
                };
                let mut call = self.scoped_env(env).with_frame(frame);
                function_result(call.eval_expr(body))
            }
            FunctionDecl::Function(def) => {
                let mut call = self.scoped_env(env).with_frame(frame);
                call.bind_parameters(func, args, &self_type)?;
                let result = function_result(call.eval_stmts(&def.body.stmts))?;
                call.coerce_return(func, def.return_type.as_ref(), result, &self_type)
            }
            FunctionDecl::Lambda(lambda) => {
                let mut call = self.scoped_env(env).with_frame(frame);
                call.bind_parameters(func, args, &self_type)?;
                let result = function_result(call.eval_expr(&lambda.body))?;
                call.coerce_return(func, lambda.return_type.as_ref(), result, &self_type)
            }
        }
    }

    /// Explicit type-argument count, then generic constraints against the
    /// explicit or inferred type arguments.
    fn check_generics(
        &self,
        func: &FunctionValue,
        args: &[Value],
        type_args: &[TypeExpr],
    ) -> Result<(), EvalError> {
        let generic_params = func.decl.generic_params();
        if !type_args.is_empty() && type_args.len() != generic_params.len() {
            return Err(type_argument_count_mismatch(
                func.name(),
                generic_params.len(),
                type_args.len(),
            ));
        }
        let constraints = collect_constraints(generic_params, func.decl.where_clause());
        if constraints.is_empty() {
            return Ok(());
        }

        let generics = generic_names(&func.decl);
        let mut bindings = Bindings::default();
        if type_args.is_empty() {
            for (param, arg) in func.decl.params().iter().zip(&args[receiver_offset(&func.decl)..]) {
                if let Some(ty) = &param.ty {
                    match_template(ty, &runtime_type(arg), &generics, &mut bindings);
                }
            }
        } else {
            bindings.extend(generics.iter().cloned().zip(type_args.iter().cloned()));
        }

        let registry = self.shared.registry.read();
        for constraint in &constraints {
            if let Some(bound) = bindings.get(&constraint.param) {
                registry.ensure_satisfies(bound, &constraint.interface)?;
            }
        }
        Ok(())
    }

    /// Bind arguments in the call scope, checking and coercing declared
    /// parameter types.
    fn bind_parameters(
        &mut self,
        func: &FunctionValue,
        args: Vec<Value>,
        self_type: &Bindings,
    ) -> Result<(), EvalError> {
        let mut args = args.into_iter();
        if receiver_offset(&func.decl) == 1 {
            if let Some(receiver) = args.next() {
                self.env.define("self", receiver);
            }
        }
        let generics = generic_names(&func.decl);
        for (index, (param, arg)) in func.decl.params().iter().zip(args).enumerate() {
            let value = {
                let registry = self.shared.registry.read();
                match param
                    .ty
                    .as_ref()
                    .and_then(|ty| checked_type(&registry, ty, &generics, self_type))
                {
                    Some(ty) => {
                        if !registry.value_matches_type(&arg, &ty) {
                            return Err(EvalError::new(format!(
                                "Parameter type mismatch for '{}': expected {ty}, got {}",
                                parameter_label(param, index),
                                arg.type_name()
                            )));
                        }
                        registry.coerce_to_type(arg, &ty)?
                    }
                    None => arg,
                }
            };
            let bindings = self.destructure(&param.pattern, &value)?;
            for (name, bound) in bindings {
                self.env.define(name, bound);
            }
        }
        Ok(())
    }

    fn coerce_return(
        &self,
        func: &FunctionValue,
        return_type: Option<&TypeExpr>,
        value: Value,
        self_type: &Bindings,
    ) -> EvalResult {
        let generics = generic_names(&func.decl);
        let registry = self.shared.registry.read();
        match return_type.and_then(|ty| checked_type(&registry, ty, &generics, self_type)) {
            Some(ty) if registry.value_matches_type(&value, &ty) => registry.coerce_to_type(value, &ty),
            _ => Ok(value),
        }
    }

    /// Pick the overload whose parameter types fit `args` most specifically;
    /// priority breaks ties.
    fn select_overload(
        &self,
        overloads: &[Arc<FunctionValue>],
        args: &[Value],
    ) -> Result<Arc<FunctionValue>, EvalError> {
        let name = overloads.first().map_or("<overload>", |f| f.name());
        let registry = self.shared.registry.read();

        let mut best: Vec<&Arc<FunctionValue>> = Vec::new();
        let mut best_rank = None;
        for candidate in overloads {
            let Some(score) = overload_score(&registry, candidate, args) else {
                continue;
            };
            let rank = (score, candidate.priority);
            match best_rank {
                Some(current) if rank < current => {}
                Some(current) if rank == current => best.push(candidate),
                _ => {
                    best_rank = Some(rank);
                    best = vec![candidate];
                }
            }
        }

        match best.as_slice() {
            [chosen] => Ok(Arc::clone(chosen)),
            [] => Err(EvalError::new(format!(
                "No overloads of {name} match provided arguments"
            ))),
            _ => Err(EvalError::new(format!("Ambiguous overload for {name}"))),
        }
    }
}

/// Specificity of `candidate` for `args`, or `None` when it does not apply.
fn overload_score(registry: &TypeRegistry, candidate: &FunctionValue, args: &[Value]) -> Option<usize> {
    if candidate.decl.arity() != args.len() {
        return None;
    }
    let generics = generic_names(&candidate.decl);
    let self_type = self_binding(&candidate.decl, args);
    let mut score = 0;
    let params = candidate.decl.params();
    for (param, arg) in params.iter().zip(&args[receiver_offset(&candidate.decl)..]) {
        let Some(ty) = &param.ty else {
            continue;
        };
        if checked_type(registry, ty, &generics, &self_type)
            .is_some_and(|checked| !registry.value_matches_type(arg, &checked))
        {
            return None;
        }
        score += template_score(ty, &generics);
    }
    Some(score)
}

/// The declared type to check runtime values against, with `Self` bound to
/// the receiver. `None` when it still mentions a generic parameter, an
/// unbound `Self`, or a free type variable.
fn checked_type(
    registry: &TypeRegistry,
    ty: &TypeExpr,
    generics: &[Name],
    self_type: &Bindings,
) -> Option<TypeExpr> {
    let ty = substitute(ty, self_type);
    let unbound_self = [Name::from(SELF_TYPE)];
    let checkable = !uses_generics(&ty, generics)
        && !uses_generics(&ty, &unbound_self)
        && registry.free_type_variables(&ty).is_empty();
    checkable.then_some(ty)
}

/// `Self` bound to the runtime type of the receiver: the implicit first
/// argument of a shorthand method, or an explicit leading `self` parameter.
fn self_binding(decl: &FunctionDecl, args: &[Value]) -> Bindings {
    let explicit_self = decl
        .params()
        .first()
        .and_then(Parameter::simple_name)
        .is_some_and(|name| name.as_str() == "self");
    let mut bindings = Bindings::default();
    if receiver_offset(decl) == 1 || explicit_self {
        if let Some(receiver) = args.first() {
            bindings.insert(Name::from(SELF_TYPE), runtime_type(receiver));
        }
    }
    bindings
}

fn generic_names(decl: &FunctionDecl) -> Vec<Name> {
    decl.generic_params().iter().map(|p| p.name.clone()).collect()
}

/// 1 when the first argument is the implicit `self` of a shorthand method.
fn receiver_offset(decl: &FunctionDecl) -> usize {
    match decl {
        FunctionDecl::Function(def) => usize::from(def.is_method_shorthand),
        _ => 0,
    }
}

fn parameter_label(param: &Parameter, index: usize) -> String {
    param
        .simple_name()
        .map_or_else(|| format!("param_{index}"), |name| name.as_str().to_string())
}
