//! Statement nodes.

use std::sync::Arc;

use super::{
    Block, Expr, FunctionDefinition, ImplDefinition, InterfaceDefinition, MethodsDefinition,
    Pattern, StructDefinition, UnionDefinition,
};
use crate::Name;

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    While {
        condition: Expr,
        body: Block,
    },
    For {
        pattern: Pattern,
        iterable: Expr,
        body: Block,
    },
    Break {
        label: Option<Name>,
        value: Option<Expr>,
    },
    Continue {
        label: Option<Name>,
    },
    Raise(Expr),
    Rethrow,
    Return(Option<Expr>),
    /// `yield v` inside an iterator literal.
    Yield(Option<Expr>),
    Struct(Arc<StructDefinition>),
    Union(Arc<UnionDefinition>),
    Interface(Arc<InterfaceDefinition>),
    Impl(Arc<ImplDefinition>),
    Methods(Arc<MethodsDefinition>),
    Function(Arc<FunctionDefinition>),
}

impl Stmt {
    /// Name this statement defines at top level, with its privacy flag.
    pub fn defined_name(&self) -> Option<(&Name, bool)> {
        match self {
            Stmt::Struct(def) => Some((&def.name, def.is_private)),
            Stmt::Union(def) => Some((&def.name, def.is_private)),
            Stmt::Interface(def) => Some((&def.name, def.is_private)),
            Stmt::Function(def) => Some((&def.name, def.is_private)),
            Stmt::Impl(def) => def.impl_name.as_ref().map(|name| (name, def.is_private)),
            _ => None,
        }
    }
}
