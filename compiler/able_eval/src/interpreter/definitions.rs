//! Registration of struct, union, interface, impl, methods, and function
//! definitions.

use std::sync::Arc;

use able_ir::ast::{
    FunctionDefinition, ImplDefinition, InterfaceDefinition, MethodsDefinition, StructDefinition,
    UnionDefinition,
};
use able_ir::Name;
use able_runtime::value::{FunctionDecl, FunctionValue, ImplNamespace};
use able_runtime::{EvalError, EvalResult, Value};
use rustc_hash::FxHashMap;

use super::Interpreter;
use crate::resolver::{ImplSpec, InterfaceEntry};

impl Interpreter {
    pub(crate) fn define_struct(&mut self, def: &Arc<StructDefinition>) -> EvalResult {
        self.shared.registry.write().register_struct(Arc::clone(def));
        self.env
            .define(def.name.clone(), Value::StructDefinition(Arc::clone(def)));
        Ok(Value::Nil)
    }

    pub(crate) fn define_union(&mut self, def: &Arc<UnionDefinition>) -> EvalResult {
        self.shared.registry.write().register_union(Arc::clone(def));
        self.env
            .define(def.name.clone(), Value::UnionDefinition(Arc::clone(def)));
        Ok(Value::Nil)
    }

    pub(crate) fn define_interface(&mut self, def: &Arc<InterfaceDefinition>) -> EvalResult {
        self.shared.registry.write().register_interface(InterfaceEntry {
            definition: Arc::clone(def),
            env: self.env.clone(),
            package: self.frame.package.clone(),
        });
        self.env
            .define(def.name.clone(), Value::InterfaceDefinition(Arc::clone(def)));
        Ok(Value::Nil)
    }

    /// Named impls become namespace values; unnamed ones join the resolver.
    #[tracing::instrument(level = "debug", skip_all, fields(interface = %def.interface_name, target = %def.target))]
    pub(crate) fn define_impl(&mut self, def: &Arc<ImplDefinition>) -> EvalResult {
        let mut methods: FxHashMap<Name, Value> = FxHashMap::default();
        for function in &def.definitions {
            let value = self.function_value(function);
            let merged = overload_with(methods.remove(&function.name), value);
            methods.insert(function.name.clone(), merged);
        }

        match &def.impl_name {
            Some(name) => {
                let methods = self
                    .shared
                    .registry
                    .read()
                    .merge_default_methods(def.interface_name.as_str(), methods)
                    .map_err(EvalError::from)?;
                let namespace = ImplNamespace {
                    name: name.clone(),
                    interface: def.interface_name.clone(),
                    target: def.target.clone(),
                    methods,
                };
                self.env
                    .define(name.clone(), Value::ImplNamespace(Arc::new(namespace)));
            }
            None => {
                self.shared.registry.write().register_impl(ImplSpec {
                    interface: def.interface_name.clone(),
                    interface_args: def.interface_args.clone(),
                    target: def.target.clone(),
                    generic_params: def.generic_params.clone(),
                    where_clause: def.where_clause.clone(),
                    methods,
                    package: self.frame.package.clone(),
                })?;
            }
        }
        Ok(Value::Nil)
    }

    /// `methods T { ... }`: inherent methods, keyed by the target's base
    /// name.
    pub(crate) fn define_methods(&mut self, def: &Arc<MethodsDefinition>) -> EvalResult {
        let Some(type_name) = def.target.base_name().cloned() else {
            return Err(EvalError::new(format!(
                "methods target must be a named type, got {}",
                def.target
            )));
        };
        for function in &def.definitions {
            let value = self.function_value(function);
            let mut registry = self.shared.registry.write();
            let existing = registry
                .inherent_method(type_name.as_str(), function.name.as_str())
                .cloned();
            registry.add_inherent(
                type_name.clone(),
                function.name.clone(),
                overload_with(existing, value),
            );
        }
        Ok(Value::Nil)
    }

    /// Redefining a function in the same scope adds an overload.
    pub(crate) fn define_function(&mut self, def: &Arc<FunctionDefinition>) -> EvalResult {
        let value = self.function_value(def);
        let existing = if self.env.has_local(def.name.as_str()) {
            self.env.lookup(def.name.as_str())
        } else {
            None
        };
        self.env.define(def.name.clone(), overload_with(existing, value));
        Ok(Value::Nil)
    }

    fn function_value(&self, def: &Arc<FunctionDefinition>) -> Arc<FunctionValue> {
        Arc::new(
            FunctionValue::new(FunctionDecl::Function(Arc::clone(def)), self.env.clone())
                .with_package(self.frame.package.clone()),
        )
    }
}

/// Add `function` to whatever function or overload set is already bound.
fn overload_with(existing: Option<Value>, function: Arc<FunctionValue>) -> Value {
    match existing {
        Some(Value::Function(previous)) => Value::FunctionOverload(vec![previous, function].into()),
        Some(Value::FunctionOverload(previous)) => {
            let mut all = previous.to_vec();
            all.push(function);
            Value::FunctionOverload(all.into())
        }
        _ => Value::Function(function),
    }
}
