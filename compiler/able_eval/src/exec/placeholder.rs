//! Placeholder analysis.
//!
//! `f(_, 1)` is a partial application: the call is not made, the callee
//! and the non-placeholder arguments are captured instead. Any other
//! expression over placeholders (`_ + 1`, `#1 * #2`, `_.name`) becomes a
//! lambda whose parameters the placeholders read.
//!
//! Anonymous `_` markers take the parameters left to right, skipping the
//! positions claimed by numbered `#N` markers.

use able_ir::ast::{Expr, ExprKind};
use able_runtime::{EvalError, EvalResult, Value};
use rustc_hash::FxHashSet;

/// `Some(index)` when `expr` is a bare `_` (`None`) or `#N` (`Some(N)`).
pub fn marker(expr: &Expr) -> Option<Option<usize>> {
    match expr.kind {
        ExprKind::Placeholder(index) => Some(index),
        _ => None,
    }
}

/// A call with a bare marker among its arguments is a partial application.
pub fn is_partial_call(args: &[Expr]) -> bool {
    args.iter().any(|arg| marker(arg).is_some())
}

/// Whether `expr`, evaluated outside any placeholder lambda, is itself a
/// placeholder lambda.
///
/// Control-flow constructs and blocks never are; a call only is when its
/// callee uses a placeholder (`_.len()`).
pub fn is_lambda_root(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Binary { .. }
        | ExprKind::Unary { .. }
        | ExprKind::Member { .. }
        | ExprKind::Index { .. }
        | ExprKind::Interpolation(_)
        | ExprKind::Array(_)
        | ExprKind::Range { .. }
        | ExprKind::StructLiteral(_)
        | ExprKind::Propagation(_) => expr.contains_placeholder(),
        ExprKind::Call { callee, args, .. } => {
            !is_partial_call(args) && callee.contains_placeholder()
        }
        _ => false,
    }
}

/// Parameter count of a placeholder lambda over `body`.
pub fn placeholder_arity(body: &Expr) -> usize {
    let mut explicit = FxHashSet::default();
    let mut highest = 0;
    let mut anonymous = 0;
    body.visit_placeholders(&mut |index| match index {
        Some(n) => {
            explicit.insert(n);
            highest = highest.max(n);
        }
        None => anonymous += 1,
    });
    highest.max(explicit.len() + anonymous)
}

/// Arguments of a running placeholder lambda.
#[derive(Clone)]
pub struct PlaceholderFrame {
    args: Vec<Value>,
    explicit: FxHashSet<usize>,
    /// Last position handed to an anonymous marker.
    cursor: usize,
}

impl PlaceholderFrame {
    pub fn new(body: &Expr, args: Vec<Value>) -> Self {
        let mut explicit = FxHashSet::default();
        body.visit_placeholders(&mut |index| {
            if let Some(n) = index {
                explicit.insert(n);
            }
        });
        PlaceholderFrame {
            args,
            explicit,
            cursor: 0,
        }
    }

    /// Value a marker reads: `#N` by position, `_` the next free one.
    pub fn value_for(&mut self, index: Option<usize>) -> EvalResult {
        let position = match index {
            Some(n) => n,
            None => {
                self.cursor += 1;
                while self.explicit.contains(&self.cursor) {
                    self.cursor += 1;
                }
                self.cursor
            }
        };
        position
            .checked_sub(1)
            .and_then(|i| self.args.get(i))
            .cloned()
            .ok_or_else(|| EvalError::new(format!("Placeholder #{position} has no argument")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
