//! Type expressions, generic parameters, and where-clauses.
//!
//! The evaluator uses type expressions at runtime for typed patterns,
//! impl target matching, and generic constraint enforcement.

use std::fmt;

use crate::Name;

/// A written type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `i32`, `Point`, `T`.
    Simple(Name),
    /// `Array<T>`, `Map<K, V>`.
    Generic { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    /// `(A, B) -> R`.
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
    /// `?T`.
    Nullable(Box<TypeExpr>),
    /// `!T`.
    Result(Box<TypeExpr>),
    /// `A | B`.
    Union(Vec<TypeExpr>),
    /// `_`.
    Wildcard,
}

impl TypeExpr {
    pub fn simple(name: impl Into<Name>) -> Self {
        TypeExpr::Simple(name.into())
    }

    pub fn generic(base: impl Into<Name>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic {
            base: Box::new(TypeExpr::Simple(base.into())),
            args,
        }
    }

    /// The head name of a simple or generic type.
    pub fn base_name(&self) -> Option<&Name> {
        match self {
            TypeExpr::Simple(name) => Some(name),
            TypeExpr::Generic { base, .. } => base.base_name(),
            _ => None,
        }
    }

    /// Type arguments of a generic application, empty otherwise.
    pub fn args(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Generic { args, .. } => args,
            _ => &[],
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Simple(name) => write!(f, "{name}"),
            TypeExpr::Generic { base, args } => {
                write!(f, "{base}<")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            TypeExpr::Function { params, ret } => {
                f.write_str("(")?;
                for (idx, param) in params.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {ret}")
            }
            TypeExpr::Nullable(inner) => write!(f, "?{inner}"),
            TypeExpr::Result(inner) => write!(f, "!{inner}"),
            TypeExpr::Union(members) => {
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeExpr::Wildcard => f.write_str("_"),
        }
    }
}

/// A generic parameter with its inline interface constraints (`T: Show + Eq`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericParameter {
    pub name: Name,
    pub constraints: Vec<TypeExpr>,
}

impl GenericParameter {
    pub fn new(name: impl Into<Name>, constraints: Vec<TypeExpr>) -> Self {
        GenericParameter {
            name: name.into(),
            constraints,
        }
    }
}

/// A where-clause entry (`where T: Show`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WhereConstraint {
    pub type_param: Name,
    pub constraints: Vec<TypeExpr>,
}
