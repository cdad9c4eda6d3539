// src/symbolic/mod.rs
//! Symbolic right-hand sides.
//!
//! Equations can be written as expression strings such as
//! `(-(V - V_rest) + R*I)/tau`. The expression is parsed into an [`Expr`],
//! constants from the function scope are bound, and the result is compiled
//! into a [`Program`] evaluated element-wise over the state array. The same
//! tree feeds [`affine::decompose`], which lets exponential Euler find the
//! linear coefficient of the drift.

pub mod affine;
pub mod expr;
pub mod parser;
pub mod program;

pub use affine::{decompose, Affine};
pub use expr::{Expr, Func};
pub use parser::{parse, ParseError};
pub use program::Program;

use crate::equation::{element, State};
use crate::error::{IntegratorError, IntegratorResult};
use ndarray::Array1;
use std::collections::BTreeMap;

/// Symbol name → value used to bind constants in an expression
pub type Scope = BTreeMap<String, f64>;

/// Name of the time symbol inside expressions
pub const TIME_SYMBOL: &str = "t";

/// Slot order used by every compiled right-hand side: variable, time, arguments
pub fn slot_layout(variable: &str, args: &[String]) -> Vec<String> {
    let mut slots = Vec::with_capacity(args.len() + 2);
    slots.push(variable.to_string());
    slots.push(TIME_SYMBOL.to_string());
    slots.extend(args.iter().cloned());
    slots
}

/// Parse `source` and bind the scope; fails on syntax errors
pub fn parse_bound(source: &str, scope: &Scope) -> IntegratorResult<Expr> {
    let expr = parse(source).map_err(|e| IntegratorError::SymbolicError {
        expression: source.to_string(),
        reason: e.to_string(),
    })?;
    Ok(expr.bind(scope))
}

/// Compile a bound expression for `variable` with positional `args`
pub fn compile(expr: &Expr, variable: &str, args: &[String]) -> IntegratorResult<Program> {
    Program::compile(expr, &slot_layout(variable, args)).map_err(|symbol| {
        IntegratorError::SymbolicError {
            expression: expr.to_string(),
            reason: format!("unknown symbol '{}'", symbol),
        }
    })
}

/// Evaluate a compiled right-hand side element-wise.
///
/// # Panics
///
/// Panics if fewer arguments are passed than the program was compiled with,
/// or if an argument is neither length 1 nor the state length.
pub fn evaluate(program: &Program, y: &State, t: f64, args: &[State]) -> State {
    let expected = program.width().saturating_sub(2);
    assert!(
        args.len() >= expected,
        "expression expects {} argument(s), got {}",
        expected,
        args.len()
    );
    let mut slots = vec![0.0; args.len() + 2];
    slots[1] = t;
    Array1::from_shape_fn(y.len(), |i| {
        slots[0] = y[i];
        for (j, arg) in args.iter().enumerate() {
            slots[j + 2] = element(arg, i);
        }
        program.eval(&slots)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_evaluate_broadcasts_arguments() {
        let scope: Scope = [("tau".to_string(), 2.0)].into_iter().collect();
        let expr = parse_bound("(I - x)/tau + t", &scope).unwrap();
        let program = compile(&expr, "x", &["I".to_string()]).unwrap();

        let y = array![0.0, 2.0, 4.0];
        let out = evaluate(&program, &y, 1.0, &[array![4.0]]);
        assert_eq!(out, array![3.0, 2.0, 1.0]);

        let out = evaluate(&program, &y, 0.0, &[array![0.0, 2.0, 4.0]]);
        assert_eq!(out, array![0.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "expression expects 1 argument(s), got 0")]
    fn test_evaluate_reports_missing_arguments() {
        let expr = parse_bound("I - x", &Scope::new()).unwrap();
        let program = compile(&expr, "x", &["I".to_string()]).unwrap();
        evaluate(&program, &array![1.0], 0.0, &[]);
    }

    #[test]
    fn test_unbound_symbol_fails_compilation() {
        let expr = parse_bound("x/tau", &Scope::new()).unwrap();
        let err = compile(&expr, "x", &[]).unwrap_err();
        assert!(matches!(err, IntegratorError::SymbolicError { .. }));
    }

    #[test]
    fn test_syntax_error_is_symbolic_error() {
        let err = parse_bound("x +* 2", &Scope::new()).unwrap_err();
        assert!(err.to_string().contains("x +* 2"));
    }
}
