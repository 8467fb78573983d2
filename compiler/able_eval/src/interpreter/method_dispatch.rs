//! Member access and method dispatch.
//!
//! `receiver.name` is resolved in this order:
//!
//! 1. fields (struct fields, error payload fields, package symbols, impl
//!    namespace methods, static methods on type values)
//! 2. inherent methods of the receiver's type
//! 3. impl methods, ranked by the resolver
//! 4. a free function in scope taking the receiver first
//!
//! Methods come back bound to their receiver, so `p.norm` is a value and
//! `p.norm()` is an ordinary call of it.

use std::sync::Arc;

use able_ir::ast::MemberName;
use able_ir::Name;
use able_runtime::errors::{
    generator_closed, no_field_or_method, no_method, no_static_method, private_method,
};
use able_runtime::value::{DynRef, GeneratorControl, InterfaceValue, PackageValue};
use able_runtime::{EvalError, EvalResult, Value};

use super::Interpreter;
use crate::exec::pattern::error_field;
use crate::resolver::runtime_type;

impl Interpreter {
    /// Value of `object.member`.
    pub(crate) fn member_value(&mut self, object: &Value, member: &MemberName) -> EvalResult {
        let name = match member {
            MemberName::Named(name) => name,
            MemberName::Positional(index) => return positional_member(object, *index),
        };
        match object {
            Value::Struct(instance) => {
                if let Some(value) = instance.field(name.as_str()) {
                    return Ok(value);
                }
            }
            Value::Error(err) => {
                if let Some(value) = error_field(err, name.as_str()) {
                    return Ok(value);
                }
            }
            Value::Package(package) => return self.package_member(package, name),
            Value::DynRef(dyn_ref) => {
                let target = self.resolve_dyn_ref(dyn_ref)?;
                return self.member_value(&target, member);
            }
            Value::ImplNamespace(namespace) => {
                return namespace
                    .methods
                    .get(name)
                    .cloned()
                    .ok_or_else(|| no_method(name.as_str(), namespace.name.as_str()));
            }
            Value::StructDefinition(def) => return self.static_member(def.name.as_str(), name),
            Value::UnionDefinition(def) => return self.static_member(def.name.as_str(), name),
            Value::InterfaceDefinition(def) => {
                return self.static_member(def.name.as_str(), name);
            }
            Value::Generator(control) => return generator_member(control, name),
            Value::Interface(iface) => return self.interface_member(iface, name),
            _ => {}
        }
        self.method_member(object, name)
    }

    /// Resolve and call `receiver.method(args...)`.
    pub(crate) fn invoke_method(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> EvalResult {
        let callee = self.member_value(receiver, &MemberName::Named(Name::new(method)))?;
        self.call_value(&callee, args)
    }

    /// Inherent method, then impl method, then a free function in scope.
    fn method_member(&mut self, receiver: &Value, name: &Name) -> EvalResult {
        let type_name = receiver.underlying().type_name().to_string();

        let inherent = self
            .shared
            .registry
            .read()
            .inherent_method(&type_name, name.as_str())
            .filter(|method| takes_receiver(method))
            .cloned();
        if let Some(method) = inherent {
            self.check_privacy(&method, name, &type_name)?;
            return Ok(Value::bound_method(receiver.clone(), method));
        }

        let ty = runtime_type(receiver);
        let resolved = self
            .shared
            .registry
            .read()
            .resolve_impl_method(&ty, name.as_str(), None)?;
        if let Some(candidate) = resolved {
            self.check_privacy(&candidate.method, name, &type_name)?;
            return Ok(Value::bound_method(receiver.clone(), candidate.method));
        }

        if let Some(function) = self.env.lookup(name.as_str()) {
            if self.accepts_receiver(&function, receiver) {
                return Ok(Value::bound_method(receiver.clone(), function));
            }
        }

        Err(match receiver.underlying() {
            Value::Struct(_) => no_field_or_method(name.as_str(), &type_name),
            _ => no_method(name.as_str(), &type_name),
        })
    }

    /// `Type.name`: inherent methods only.
    fn static_member(&self, type_name: &str, name: &Name) -> EvalResult {
        let method = self
            .shared
            .registry
            .read()
            .inherent_method(type_name, name.as_str())
            .cloned();
        match method {
            Some(method) => {
                self.check_privacy(&method, name, type_name)?;
                Ok(method)
            }
            None => Err(no_static_method(name.as_str(), type_name)),
        }
    }

    /// A value seen through an interface: its fields, the method cache,
    /// inherent methods, then impls of that interface, then any method.
    fn interface_member(&mut self, iface: &Arc<InterfaceValue>, name: &Name) -> EvalResult {
        let receiver = iface.underlying.clone();
        if let Value::Struct(instance) = receiver.underlying() {
            if let Some(value) = instance.field(name.as_str()) {
                return Ok(value);
            }
        }
        if let Some(method) = iface.cached_method(name.as_str()) {
            return Ok(Value::bound_method(receiver, method));
        }

        let type_name = receiver.underlying().type_name().to_string();
        let inherent = self
            .shared
            .registry
            .read()
            .inherent_method(&type_name, name.as_str())
            .filter(|method| takes_receiver(method))
            .cloned();
        let resolved = match inherent {
            Some(method) => Some(method),
            None => self
                .shared
                .registry
                .read()
                .resolve_impl_method(&runtime_type(&receiver), name.as_str(), Some(iface.interface.as_str()))?
                .map(|candidate| candidate.method),
        };
        match resolved {
            Some(method) => {
                self.check_privacy(&method, name, &type_name)?;
                iface.cache_method(name.clone(), method.clone());
                Ok(Value::bound_method(receiver, method))
            }
            None => self.method_member(&receiver, name),
        }
    }

    fn package_member(&self, package: &PackageValue, name: &Name) -> EvalResult {
        if let Some(value) = package.symbols.get(name) {
            return Ok(value.clone());
        }
        let packages = self.shared.packages.read();
        match packages.get(package.name.as_str()) {
            Some(entry) if entry.private.contains(name) => Err(EvalError::new(format!(
                "Symbol '{name}' in package '{}' is private",
                package.name
            ))),
            Some(entry) => entry.public.get(name).cloned().ok_or_else(|| {
                EvalError::new(format!("Package '{}' has no symbol '{name}'", package.name))
            }),
            None => Err(EvalError::new(format!(
                "Package '{}' has no symbol '{name}'",
                package.name
            ))),
        }
    }

    /// Look a dynamic reference up in the package registry.
    pub(crate) fn resolve_dyn_ref(&self, dyn_ref: &DynRef) -> EvalResult {
        self.shared
            .packages
            .read()
            .symbol(dyn_ref.package.as_str(), &dyn_ref.name)
            .map_err(EvalError::from)
    }

    /// Private functions are visible only inside their defining package.
    fn check_privacy(&self, method: &Value, name: &Name, type_name: &str) -> Result<(), EvalError> {
        match method {
            Value::Function(func) if func.decl.is_private() && func.package != self.frame.package => {
                Err(private_method(name.as_str(), type_name))
            }
            _ => Ok(()),
        }
    }

    /// Whether a free function can be called as a method of `receiver`:
    /// its first parameter is untyped or accepts the receiver.
    fn accepts_receiver(&self, function: &Value, receiver: &Value) -> bool {
        let Value::Function(func) = function else {
            return matches!(function, Value::Native(_));
        };
        let Some(first) = func.decl.params().first() else {
            return false;
        };
        match &first.ty {
            Some(ty) => self.shared.registry.read().value_matches_type(receiver, ty),
            None => true,
        }
    }
}

/// Whether an inherent method is called on instances rather than the type.
fn takes_receiver(method: &Value) -> bool {
    match method {
        Value::Native(_) => true,
        Value::Function(func) => func.decl.expects_self(),
        Value::FunctionOverload(overloads) => overloads.iter().any(|f| f.decl.expects_self()),
        _ => false,
    }
}

fn positional_member(object: &Value, index: usize) -> EvalResult {
    match object.underlying() {
        Value::Struct(instance) => instance
            .positional(index)
            .ok_or_else(|| no_field_or_method(&index.to_string(), instance.definition.name.as_str())),
        other => Err(no_field_or_method(&index.to_string(), other.type_name())),
    }
}

/// `gen.yield(v)` and `gen.stop()` inside an iterator literal.
fn generator_member(control: &Arc<dyn GeneratorControl>, name: &Name) -> EvalResult {
    let control = Arc::clone(control);
    match name.as_str() {
        "yield" => Ok(Value::native("yield", Some(1), move |_, args| {
            let value = args.into_iter().next().unwrap_or(Value::Nil);
            control.yield_value(value)?;
            Ok(Value::Nil)
        })),
        "stop" => Ok(Value::native("stop", Some(0), move |_, _| {
            control.stop();
            Err(generator_closed())
        })),
        other => Err(no_method(other, "Generator")),
    }
}
