//! Runtime values for the Able interpreter.
//!
//! `Value` is a closed enum; every consumer matches it exhaustively. Heap
//! payloads sit behind `Arc` so values cross thread boundaries freely when
//! procs, futures, and generators run on their own workers.
//!
//! Mutable aggregates (arrays, struct fields, interface method caches) guard
//! their contents with `parking_lot::RwLock`. Cloning a `Value` shares the
//! aggregate; it never deep-copies.
//!
//! Construct heap values through the factory methods:
//!
//! ```text
//! let s = Value::string("hello");
//! let xs = Value::array(vec![Value::i32(1), Value::i32(2)]);
//! let err = Value::error("boom");
//! ```

mod compare;
mod composite;
mod display;
mod numeric;

use std::fmt;
use std::sync::Arc;

use able_ir::ast::{InterfaceDefinition, StructDefinition, UnionDefinition};
use able_ir::Name;

use crate::call::CallContext;
use crate::errors::EvalResult;
use crate::iterator::IteratorRef;
use crate::proc::TaskHandle;
use crate::sync::{Channel, MutexHandle};

pub use compare::{compare_values, values_equal, FLOAT_EPSILON};
pub use composite::{
    ArgSlot, ArrayRef, BoundMethod, DynRef, ErrorValue, FunctionDecl, FunctionValue,
    GeneratorControl, ImplNamespace, InterfaceValue, NativeFn, NativeFunction, PackageValue,
    PartialFunction, RangeValue, StructFields, StructInstance,
};
pub use numeric::{promote_integer_types, FloatValue, IntegerValue};

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    // Primitives
    Nil,
    /// Result of statements and side-effecting natives.
    Void,
    Bool(bool),
    Char(char),
    String(Arc<str>),
    Integer(IntegerValue),
    Float(FloatValue),

    // Aggregates
    /// Mutable sequence, shared by reference.
    Array(ArrayRef),
    Range(RangeValue),
    Struct(Arc<StructInstance>),

    // Definitions as first-class values
    /// Calling it constructs a positional instance.
    StructDefinition(Arc<StructDefinition>),
    UnionDefinition(Arc<UnionDefinition>),
    InterfaceDefinition(Arc<InterfaceDefinition>),
    /// A value viewed through an interface, with a resolved-method cache.
    Interface(Arc<InterfaceValue>),

    // Callables
    Function(Arc<FunctionValue>),
    /// Same-named functions; one is selected per call.
    FunctionOverload(Arc<[Arc<FunctionValue>]>),
    Native(Arc<NativeFunction>),
    BoundMethod(Arc<BoundMethod>),
    /// A call with placeholder arguments awaiting the rest.
    Partial(Arc<PartialFunction>),

    // Tasks and iteration
    Proc(TaskHandle),
    /// Memoizing task handle.
    Future(TaskHandle),
    Iterator(IteratorRef),
    /// Sentinel returned by `next()` once an iterator is exhausted.
    IteratorEnd,
    /// The `gen` binding inside an iterator literal.
    Generator(Arc<dyn GeneratorControl>),

    // Namespaces
    Package(Arc<PackageValue>),
    /// Package symbol resolved at use time.
    DynRef(Arc<DynRef>),
    ImplNamespace(Arc<ImplNamespace>),

    Error(Arc<ErrorValue>),

    // Concurrency primitives
    Channel(Channel),
    Mutex(MutexHandle),
}

// Factory Methods

impl Value {
    #[inline]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    /// An `i32` integer, the kind of unsuffixed literals.
    #[inline]
    pub fn i32(n: i32) -> Self {
        Value::Integer(IntegerValue::from_i32(n))
    }

    /// An integer of the given kind, range-checked.
    pub fn integer(value: i128, ty: able_ir::ast::IntegerType) -> EvalResult {
        IntegerValue::new(value, ty).map(Value::Integer)
    }

    /// An `f64` float, the kind of unsuffixed literals.
    #[inline]
    pub fn f64(value: f64) -> Self {
        Value::Float(FloatValue::f64(value))
    }

    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(ArrayRef::new(items))
    }

    /// An untyped error value carrying only a message.
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(Arc::new(ErrorValue::new(message)))
    }

    pub fn error_value(error: ErrorValue) -> Self {
        Value::Error(Arc::new(error))
    }

    pub fn native(
        name: impl Into<Name>,
        arity: Option<usize>,
        func: impl Fn(&mut dyn CallContext, Vec<Value>) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        Value::Native(Arc::new(NativeFunction::new(name, arity, func)))
    }

    pub fn function(function: FunctionValue) -> Self {
        Value::Function(Arc::new(function))
    }

    pub fn bound_method(receiver: Value, method: Value) -> Self {
        Value::BoundMethod(Arc::new(BoundMethod { receiver, method }))
    }

    pub fn struct_instance(instance: StructInstance) -> Self {
        Value::Struct(Arc::new(instance))
    }
}

// Value Methods

impl Value {
    /// Truthiness used by `if`, `while`, and guards.
    ///
    /// `false`, `nil`, and error values are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil | Value::Error(_) => false,
            _ => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<IntegerValue> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integer or float widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(i.to_f64()),
            Value::Float(f) => Some(f.value()),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_)
                | Value::FunctionOverload(_)
                | Value::Native(_)
                | Value::BoundMethod(_)
                | Value::Partial(_)
                | Value::DynRef(_)
                | Value::StructDefinition(_)
        )
    }

    /// Strip any interface wrappers.
    pub fn underlying(&self) -> &Value {
        match self {
            Value::Interface(iv) => iv.underlying.underlying(),
            other => other,
        }
    }

    /// Name of the runtime type, used in method lookup and error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "nil",
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::String(_) => "String",
            Value::Integer(i) => i.ty().name(),
            Value::Float(f) => f.ty().name(),
            Value::Array(_) => "Array",
            Value::Range(_) => "Range",
            Value::Struct(inst) => inst.definition.name.as_str(),
            Value::StructDefinition(_) => "StructDefinition",
            Value::UnionDefinition(_) => "UnionDefinition",
            Value::InterfaceDefinition(_) => "InterfaceDefinition",
            Value::Interface(iv) => iv.interface.as_str(),
            Value::Function(_) | Value::FunctionOverload(_) => "Function",
            Value::Native(_) => "NativeFunction",
            Value::BoundMethod(_) => "BoundMethod",
            Value::Partial(_) => "PartialFunction",
            Value::Proc(_) => "ProcHandle",
            Value::Future(_) => "Future",
            Value::Iterator(_) => "Iterator",
            Value::IteratorEnd => "IteratorEnd",
            Value::Generator(_) => "Generator",
            Value::Package(_) => "Package",
            Value::DynRef(_) => "DynRef",
            Value::ImplNamespace(_) => "ImplNamespace",
            Value::Error(err) => err.type_name.as_ref().map_or("Error", Name::as_str),
            Value::Channel(_) => "Channel",
            Value::Mutex(_) => "Mutex",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Void => f.write_str("Void"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Char(c) => write!(f, "Char({c:?})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Integer(i) => write!(f, "Integer({i}_{})", i.ty()),
            Value::Float(x) => write!(f, "Float({}_{})", x.value(), x.ty()),
            Value::Array(items) => f.debug_tuple("Array").field(&items.snapshot()).finish(),
            Value::Error(err) => write!(f, "Error({:?})", err.message),
            other => write!(f, "{}({other})", other.type_name()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
