//! Evaluation helpers the `Interpreter` delegates to.
//!
//! These are free functions over values and the type registry; none of
//! them walks the tree on its own.
//!
//! - `expr`: literals, indexing, ranges, interpolation, raise values
//! - `control`: how loop and call boundaries treat control-flow signals
//! - `pattern`: structural matching and destructuring
//! - `placeholder`: `_` / `#N` analysis for placeholder lambdas and partial
//!   application

pub mod control;
pub mod expr;
pub mod pattern;
pub mod placeholder;
