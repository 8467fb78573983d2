//! Declarations: functions, structs, unions, interfaces, impls, and
//! inherent method blocks.

use std::sync::Arc;

use super::{Block, GenericParameter, Pattern, TypeExpr, WhereConstraint};
use crate::Name;

/// Function or lambda parameter. The pattern may destructure.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub pattern: Pattern,
    pub ty: Option<TypeExpr>,
}

impl Parameter {
    pub fn named(name: impl Into<Name>) -> Self {
        Parameter {
            pattern: Pattern::Identifier(name.into()),
            ty: None,
        }
    }

    pub fn typed(name: impl Into<Name>, ty: TypeExpr) -> Self {
        Parameter {
            pattern: Pattern::Identifier(name.into()),
            ty: Some(ty),
        }
    }

    /// Name of a plain identifier parameter.
    pub fn simple_name(&self) -> Option<&Name> {
        match &self.pattern {
            Pattern::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDefinition {
    pub name: Name,
    pub generic_params: Vec<GenericParameter>,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeExpr>,
    pub body: Block,
    pub where_clause: Vec<WhereConstraint>,
    /// `fn #name(...)`: the receiver is implicit and not listed in `params`.
    pub is_method_shorthand: bool,
    pub is_private: bool,
}

impl FunctionDefinition {
    /// Whether this function, used as a method, takes the receiver.
    pub fn expects_self(&self) -> bool {
        if self.is_method_shorthand {
            return true;
        }
        let Some(first) = self.params.first() else {
            return false;
        };
        if first
            .simple_name()
            .is_some_and(|name| name.as_str().eq_ignore_ascii_case("self"))
        {
            return true;
        }
        matches!(&first.ty, Some(TypeExpr::Simple(name)) if name == "Self")
    }

    /// Number of arguments a call must supply, receiver included.
    pub fn arity(&self) -> usize {
        self.params.len() + usize::from(self.is_method_shorthand)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Copy)]
pub enum StructKind {
    Named,
    Positional,
    /// No fields; the bare name evaluates to an instance.
    Singleton,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructFieldDefinition {
    /// `None` for positional fields.
    pub name: Option<Name>,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDefinition {
    pub name: Name,
    pub generic_params: Vec<GenericParameter>,
    pub kind: StructKind,
    pub fields: Vec<StructFieldDefinition>,
    pub where_clause: Vec<WhereConstraint>,
    pub is_private: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionDefinition {
    pub name: Name,
    pub generic_params: Vec<GenericParameter>,
    pub variants: Vec<TypeExpr>,
    pub is_private: bool,
}

/// Interface method signature; a default body makes it optional in impls.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSignature {
    pub name: Name,
    pub generic_params: Vec<GenericParameter>,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeExpr>,
    pub default_impl: Option<Arc<FunctionDefinition>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDefinition {
    pub name: Name,
    pub generic_params: Vec<GenericParameter>,
    /// `for T` pattern the interface is declared over, if any.
    pub self_type: Option<TypeExpr>,
    pub signatures: Vec<FunctionSignature>,
    pub base_interfaces: Vec<TypeExpr>,
    pub is_private: bool,
}

/// `impl Interface for Target { ... }`, optionally named (`Name = impl ...`).
#[derive(Clone, Debug, PartialEq)]
pub struct ImplDefinition {
    pub interface_name: Name,
    pub interface_args: Vec<TypeExpr>,
    pub target: TypeExpr,
    pub generic_params: Vec<GenericParameter>,
    pub where_clause: Vec<WhereConstraint>,
    pub definitions: Vec<Arc<FunctionDefinition>>,
    pub impl_name: Option<Name>,
    pub is_private: bool,
}

/// `methods Target { ... }`: inherent methods.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodsDefinition {
    pub target: TypeExpr,
    pub generic_params: Vec<GenericParameter>,
    pub where_clause: Vec<WhereConstraint>,
    pub definitions: Vec<Arc<FunctionDefinition>>,
}
