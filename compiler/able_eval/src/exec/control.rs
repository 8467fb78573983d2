//! How loops and call boundaries treat control-flow signals.
//!
//! Signals travel as `Err(EvalError)` with `signal` set. Each construct
//! intercepts only the signals aimed at it and forwards everything else
//! unchanged.

use able_ir::Name;
use able_runtime::errors::{break_outside_loop, continue_outside_loop, return_outside_function};
use able_runtime::{EvalError, EvalResult, Signal, Value};

/// What a loop does with the outcome of one body iteration.
pub enum LoopAction {
    /// Run the next iteration.
    Next,
    /// Leave the loop with this value.
    Exit(Value),
    /// Not a signal for this loop; propagate.
    Propagate(EvalError),
}

/// Classify an iteration outcome. Only unlabeled `break`/`continue` stop
/// here; labeled ones belong to a breakpoint.
pub fn loop_action(result: EvalResult) -> LoopAction {
    match result {
        Ok(_) => LoopAction::Next,
        Err(err) => match err.signal {
            Some(Signal::Break { label: None, value }) => LoopAction::Exit(value),
            Some(Signal::Continue { label: None }) => LoopAction::Next,
            _ => LoopAction::Propagate(err),
        },
    }
}

/// Outcome of one breakpoint body run.
pub enum BreakpointAction {
    Done(Value),
    /// A labeled `continue` targeted this breakpoint.
    Rerun,
    Propagate(EvalError),
}

pub fn breakpoint_action(label: &Name, result: EvalResult) -> BreakpointAction {
    match result {
        Ok(value) => BreakpointAction::Done(value),
        Err(err) => match &err.signal {
            Some(Signal::Break {
                label: Some(target),
                value,
            }) if target == label => BreakpointAction::Done(value.clone()),
            Some(Signal::Continue {
                label: Some(target),
            }) if target == label => BreakpointAction::Rerun,
            _ => BreakpointAction::Propagate(err),
        },
    }
}

/// Intercept `return` at a function or lambda boundary.
///
/// Unlabeled `break`/`continue` cannot cross a call; labeled ones can,
/// since their label was checked against the live breakpoints.
pub fn function_result(result: EvalResult) -> EvalResult {
    match result {
        Ok(value) => Ok(value),
        Err(err) => match err.signal {
            Some(Signal::Return(value)) => Ok(value),
            Some(Signal::Break { label: None, .. }) => Err(break_outside_loop()),
            Some(Signal::Continue { label: None }) => Err(continue_outside_loop()),
            _ => Err(err),
        },
    }
}

/// Turn signals that escaped a module body, or an async task body, into
/// errors. Raises stay raises.
pub fn top_level_result(result: EvalResult) -> EvalResult {
    match result {
        Ok(value) => Ok(value),
        Err(err) => match err.signal {
            Some(Signal::Return(_)) => Err(return_outside_function()),
            Some(Signal::Break { .. }) => Err(break_outside_loop()),
            Some(Signal::Continue { .. }) => Err(continue_outside_loop()),
            _ => Err(err),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
