//! Abstract syntax tree consumed by the evaluator.

pub mod build;
mod decl;
mod expr;
mod literal;
mod module;
mod operators;
mod pattern;
mod stmt;
mod types;

pub use decl::{
    FunctionDefinition, FunctionSignature, ImplDefinition, InterfaceDefinition, MethodsDefinition,
    Parameter, StructDefinition, StructFieldDefinition, StructKind, UnionDefinition,
};
pub use expr::{
    AssignTarget, Block, Expr, ExprKind, IteratorLiteral, LambdaExpr, MatchClause, MemberName,
    OrClause, StructFieldInit, StructLiteral,
};
pub use literal::{FloatType, IntegerType, Literal};
pub use module::{Import, ImportSelector, Module, PackageDecl};
pub use operators::{AssignOp, BinaryOp, UnaryOp};
pub use pattern::{ArrayRest, Pattern, StructPattern, StructPatternField};
pub use stmt::Stmt;
pub use types::{GenericParameter, TypeExpr, WhereConstraint};

#[cfg(test)]
mod tests;
