//! Heap payloads of composite values.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use able_ir::ast::{
    Expr, FunctionDefinition, GenericParameter, LambdaExpr, Parameter,
    StructDefinition, TypeExpr, WhereConstraint,
};
use able_ir::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{IntegerValue, Value};
use crate::call::CallContext;
use crate::environment::Environment;
use crate::errors::{EvalError, EvalResult};

// Arrays

/// Shared, mutable array storage.
#[derive(Clone)]
pub struct ArrayRef(Arc<RwLock<Vec<Value>>>);

impl ArrayRef {
    pub fn new(items: Vec<Value>) -> Self {
        ArrayRef(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Overwrite an existing slot; `false` when out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.0.write().push(value);
    }

    pub fn pop(&self) -> Option<Value> {
        self.0.write().pop()
    }

    /// Copy of the current elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// Ranges

/// `start..end` (inclusive) or `start...end` (exclusive).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RangeValue {
    pub start: IntegerValue,
    pub end: IntegerValue,
    pub inclusive: bool,
}

impl RangeValue {
    /// Whether the range counts down.
    pub fn descending(&self) -> bool {
        self.end.cmp_value(self.start) == Ordering::Less
    }

    /// Whether `value` is still inside the range when walking from the start.
    pub fn contains_step(&self, value: IntegerValue) -> bool {
        let ordering = value.cmp_value(self.end);
        match (self.descending(), self.inclusive) {
            (false, true) => ordering != Ordering::Greater,
            (false, false) => ordering == Ordering::Less,
            (true, true) => ordering != Ordering::Less,
            (true, false) => ordering == Ordering::Greater,
        }
    }
}

// Structs

/// Field storage, fixed as named or positional at construction.
#[derive(Clone)]
pub enum StructFields {
    /// In declaration order.
    Named(Vec<(Name, Value)>),
    Positional(Vec<Value>),
}

impl StructFields {
    pub fn len(&self) -> usize {
        match self {
            StructFields::Named(fields) => fields.len(),
            StructFields::Positional(slots) => slots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct StructInstance {
    pub definition: Arc<StructDefinition>,
    fields: RwLock<StructFields>,
    /// Explicit type arguments from the literal, if any.
    pub type_args: Vec<TypeExpr>,
}

impl StructInstance {
    pub fn new(
        definition: Arc<StructDefinition>,
        fields: StructFields,
        type_args: Vec<TypeExpr>,
    ) -> Self {
        StructInstance {
            definition,
            fields: RwLock::new(fields),
            type_args,
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(*self.fields.read(), StructFields::Positional(_))
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        match &*self.fields.read() {
            StructFields::Named(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value.clone()),
            StructFields::Positional(_) => None,
        }
    }

    pub fn positional(&self, index: usize) -> Option<Value> {
        match &*self.fields.read() {
            StructFields::Positional(slots) => slots.get(index).cloned(),
            StructFields::Named(_) => None,
        }
    }

    /// Overwrite a named field; `false` if no such field exists.
    pub fn set_field(&self, name: &str, value: Value) -> bool {
        match &mut *self.fields.write() {
            StructFields::Named(fields) => match fields.iter_mut().find(|(f, _)| f == name) {
                Some((_, slot)) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            StructFields::Positional(_) => false,
        }
    }

    /// Overwrite a positional slot; `false` if out of range.
    pub fn set_positional(&self, index: usize, value: Value) -> bool {
        match &mut *self.fields.write() {
            StructFields::Positional(slots) => match slots.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            StructFields::Named(_) => false,
        }
    }

    pub fn fields(&self) -> StructFields {
        self.fields.read().clone()
    }
}

// Interfaces

/// A value statically viewed through an interface.
pub struct InterfaceValue {
    pub interface: Name,
    pub underlying: Value,
    method_cache: RwLock<FxHashMap<Name, Value>>,
}

impl InterfaceValue {
    pub fn new(interface: Name, underlying: Value) -> Self {
        InterfaceValue {
            interface,
            underlying,
            method_cache: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn cached_method(&self, name: &str) -> Option<Value> {
        self.method_cache.read().get(name).cloned()
    }

    pub fn cache_method(&self, name: Name, method: Value) {
        self.method_cache.write().insert(name, method);
    }
}

// Functions

/// Declaration behind a user function value.
#[derive(Clone)]
pub enum FunctionDecl {
    Function(Arc<FunctionDefinition>),
    Lambda(Arc<LambdaExpr>),
    /// `_ + 1`: an expression over placeholders, called with `arity` args.
    Placeholder { body: Arc<Expr>, arity: usize },
}

impl FunctionDecl {
    pub fn name(&self) -> &str {
        match self {
            FunctionDecl::Function(def) => def.name.as_str(),
            FunctionDecl::Lambda(_) => "<lambda>",
            FunctionDecl::Placeholder { .. } => "<placeholder>",
        }
    }

    pub fn params(&self) -> &[Parameter] {
        match self {
            FunctionDecl::Function(def) => &def.params,
            FunctionDecl::Lambda(lambda) => &lambda.params,
            FunctionDecl::Placeholder { .. } => &[],
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            FunctionDecl::Function(def) => def.arity(),
            FunctionDecl::Lambda(lambda) => lambda.params.len(),
            FunctionDecl::Placeholder { arity, .. } => *arity,
        }
    }

    pub fn generic_params(&self) -> &[GenericParameter] {
        match self {
            FunctionDecl::Function(def) => &def.generic_params,
            FunctionDecl::Lambda(lambda) => &lambda.generic_params,
            FunctionDecl::Placeholder { .. } => &[],
        }
    }

    pub fn where_clause(&self) -> &[WhereConstraint] {
        match self {
            FunctionDecl::Function(def) => &def.where_clause,
            FunctionDecl::Lambda(lambda) => &lambda.where_clause,
            FunctionDecl::Placeholder { .. } => &[],
        }
    }

    /// Whether the function takes the receiver when used as a method.
    pub fn expects_self(&self) -> bool {
        match self {
            FunctionDecl::Function(def) => def.expects_self(),
            FunctionDecl::Lambda(_) | FunctionDecl::Placeholder { .. } => false,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, FunctionDecl::Function(def) if def.is_private)
    }
}

/// A user function: declaration plus captured environment.
#[derive(Clone)]
pub struct FunctionValue {
    pub decl: FunctionDecl,
    pub closure: Environment,
    /// Defining package, for privacy checks.
    pub package: Option<Name>,
    /// Overload tie-breaker; higher wins.
    pub priority: i32,
}

impl FunctionValue {
    pub fn new(decl: FunctionDecl, closure: Environment) -> Self {
        FunctionValue {
            decl,
            closure,
            package: None,
            priority: 0,
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: Option<Name>) -> Self {
        self.package = package;
        self
    }

    pub fn name(&self) -> &str {
        self.decl.name()
    }
}

/// Host function body.
pub type NativeFn = Arc<dyn Fn(&mut dyn CallContext, Vec<Value>) -> EvalResult + Send + Sync>;

pub struct NativeFunction {
    pub name: Name,
    /// `None` accepts any number of arguments.
    pub arity: Option<usize>,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<Name>,
        arity: Option<usize>,
        func: impl Fn(&mut dyn CallContext, Vec<Value>) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    pub fn invoke(&self, ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
        (self.func)(ctx, args)
    }
}

/// Receiver paired with the method it will be passed to.
pub struct BoundMethod {
    pub receiver: Value,
    pub method: Value,
}

/// Argument slot of a partial application.
#[derive(Clone)]
pub enum ArgSlot {
    Bound(Value),
    /// `_` when `None`, `#N` when `Some(N)`.
    Hole(Option<usize>),
}

pub struct PartialFunction {
    pub target: Value,
    pub slots: Vec<ArgSlot>,
}

impl PartialFunction {
    /// Number of arguments needed to fill every hole.
    pub fn arity(&self) -> usize {
        let mut anonymous = 0;
        let mut highest = 0;
        for slot in &self.slots {
            match slot {
                ArgSlot::Hole(None) => anonymous += 1,
                ArgSlot::Hole(Some(n)) => highest = highest.max(*n),
                ArgSlot::Bound(_) => {}
            }
        }
        highest.max(anonymous)
    }

    /// Fill the holes: anonymous ones left to right, numbered ones by index.
    pub fn fill(&self, args: &[Value]) -> Option<Vec<Value>> {
        let mut next = 0;
        let mut out = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let value = match slot {
                ArgSlot::Bound(value) => value.clone(),
                ArgSlot::Hole(None) => {
                    let value = args.get(next)?.clone();
                    next += 1;
                    value
                }
                ArgSlot::Hole(Some(n)) => args.get(n.checked_sub(1)?)?.clone(),
            };
            out.push(value);
        }
        Some(out)
    }
}

// Generators

/// Controller bound inside an iterator literal body.
pub trait GeneratorControl: Send + Sync {
    /// Hand `value` to the consumer and wait for the next request.
    fn yield_value(&self, value: Value) -> Result<(), EvalError>;
    /// End the generator after the current step.
    fn stop(&self);
}

// Namespaces

/// Public symbols of a package.
pub struct PackageValue {
    pub name: Name,
    pub symbols: FxHashMap<Name, Value>,
}

/// A symbol looked up in the package registry each time it is used.
pub struct DynRef {
    pub package: Name,
    pub name: Name,
}

/// A named impl, usable as `Name.method(receiver, ...)`.
pub struct ImplNamespace {
    pub name: Name,
    pub interface: Name,
    pub target: TypeExpr,
    pub methods: FxHashMap<Name, Value>,
}

// Errors

/// A raised or returned error.
#[derive(Clone)]
pub struct ErrorValue {
    /// Error struct name for typed errors.
    pub type_name: Option<Name>,
    pub message: String,
    /// Structured fields, in insertion order.
    pub payload: Vec<(Name, Value)>,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorValue {
            type_name: None,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<Name>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<Name>, value: Value) -> Self {
        self.payload.push((name.into(), value));
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorValue")
            .field("type_name", &self.type_name)
            .field("message", &self.message)
            .field("payload", &self.payload)
            .finish()
    }
}
