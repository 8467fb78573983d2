//! Able IR - syntax tree types for the Able interpreter.
//!
//! The evaluator consumes an already-parsed tree; this crate only defines
//! its shape. Nodes that outlive a single evaluation pass (function bodies,
//! lambdas, iterator literals, async task bodies, and type definitions) are
//! held behind `Arc` so runtime values can own them without copying the tree.
//!
//! # Layout
//!
//! - [`Name`]: cheap, shareable identifier
//! - [`Span`]: byte-offset source location
//! - [`ast`]: literals, type expressions, patterns, expressions, statements,
//!   declarations, and the [`ast::build`] helpers used by tests and embedders

pub mod ast;
mod name;
mod span;

pub use name::Name;
pub use span::Span;
