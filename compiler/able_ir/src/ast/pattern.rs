//! Destructuring patterns.
//!
//! Used by assignment, function parameters, `match`, `rescue`, and `for`.

use super::{Literal, TypeExpr};
use crate::Name;

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    /// Binds (or rebinds) the whole value.
    Identifier(Name),
    /// `_`: matches anything, binds nothing.
    Wildcard,
    /// Matches by value equality.
    Literal(Literal),
    /// `Point { x, y: py }` or `Pair { a, b }` written positionally.
    Struct(StructPattern),
    /// `[first, second, ...rest]`.
    Array {
        elements: Vec<Pattern>,
        rest: Option<ArrayRest>,
    },
    /// `x: i64`: checks the runtime type, then coerces before recursing.
    Typed {
        pattern: Box<Pattern>,
        ty: TypeExpr,
    },
}

impl Pattern {
    pub fn ident(name: impl Into<Name>) -> Self {
        Pattern::Identifier(name.into())
    }

    /// Names this pattern binds, in source order.
    pub fn bound_names(&self) -> Vec<Name> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names(&self, out: &mut Vec<Name>) {
        match self {
            Pattern::Identifier(name) => out.push(name.clone()),
            Pattern::Wildcard | Pattern::Literal(_) => {}
            Pattern::Struct(sp) => {
                for field in &sp.fields {
                    field.pattern.collect_names(out);
                    if let Some(binding) = &field.binding {
                        out.push(binding.clone());
                    }
                }
            }
            Pattern::Array { elements, rest } => {
                for element in elements {
                    element.collect_names(out);
                }
                if let Some(ArrayRest::Bind(name)) = rest {
                    out.push(name.clone());
                }
            }
            Pattern::Typed { pattern, .. } => pattern.collect_names(out),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructPattern {
    /// Struct (or error) type the value must have, if written.
    pub struct_type: Option<Name>,
    pub fields: Vec<StructPatternField>,
    /// Fields are matched by position rather than by name.
    pub positional: bool,
    /// Positional pattern may cover fewer slots than the struct has.
    pub has_rest: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructPatternField {
    /// Field name for named patterns; `None` for positional.
    pub field: Option<Name>,
    pub pattern: Pattern,
    /// Extra binding for the whole field value (`field: sub @ name`).
    pub binding: Option<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayRest {
    /// `...` or `..._`
    Wildcard,
    /// `...rest`
    Bind(Name),
}
