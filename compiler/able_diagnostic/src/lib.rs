//! Diagnostics produced by an external static pass.
//!
//! The evaluator never needs these to run a program. An embedder that ran a
//! typechecker hands its records to the interpreter together with a
//! [`DiagnosticPolicy`] deciding whether error-severity records stop
//! evaluation or are only logged.

mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticPolicy, Label, Severity};

#[cfg(test)]
mod tests;
