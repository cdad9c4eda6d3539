// src/solvers/exponential.rs
//! Exponential Euler
//!
//! # Mathematical Framework
//!
//! For a drift split as `f(y) = A·y + F(y)`, the linear part is integrated
//! exactly over one step:
//! ```text
//! ODE:  y_{n+1} = y_n + φ(A Δt) Δt f(y_n)
//! SDE:  y_{n+1} = y_n + φ(A Δt) Δt f(y_n) + e^{A Δt} g(y_n) √Δt dW_n
//! φ(z) = (e^z - 1) / z
//! ```
//! which reproduces `y_0 e^{A t}` exactly when `F = 0`.
//!
//! # Finding A
//!
//! - A [`Drift::Linearized`] drift reports `A` itself. This is the only
//!   contract accepted for stochastic equations.
//! - A symbolic drift is decomposed with [`symbolic::decompose`]. If it is
//!   affine in the variable with a non-zero coefficient, `A` is compiled
//!   (and `φ` precomputed when `A` is constant); otherwise the step falls back
//!   to explicit Euler.
//! - Any other drift falls back to explicit Euler.
//!
//! A coefficient that evaluates to exactly zero at run time yields `nan`;
//! it is not trapped here.

use super::euler::ode_euler;
use super::{deterministic, diffusion_of, with_step, SchemeParams, StepFunction, StepOutput};
use crate::equation::{element, Drift, Equation, EquationKind, Linearized, State};
use crate::error::{IntegratorError, IntegratorResult};
use crate::symbolic;
use ndarray::Array1;

const METHOD: &str = "exponential";

/// `y + φ(A·dt)·dt·f`, with `A` and `f` broadcast when they have length 1
fn exponential_update(y: &State, derivative: &State, linear: &State, dt: f64) -> State {
    Array1::from_shape_fn(y.len(), |i| {
        let a = element(linear, i);
        y[i] + ((a * dt).exp() - 1.0) / a * element(derivative, i)
    })
}

pub fn ode_exponential(equation: &Equation, dt: f64, params: &SchemeParams) -> IntegratorResult<StepFunction> {
    if let Drift::Linearized(f) = equation.drift() {
        let f = f.clone();
        return match equation.kind() {
            EquationKind::DeterministicSingle => Ok(with_step(METHOD, equation, dt, move |y, t, args, _| {
                let Linearized { derivative, linear, .. } = f(y, t, args);
                StepOutput::single(exponential_update(y, &derivative, &linear, dt))
            })),
            EquationKind::DeterministicMulti => Ok(with_step(METHOD, equation, dt, move |y, t, args, _| {
                let Linearized { derivative, linear, aux } = f(y, t, args);
                StepOutput {
                    state: exponential_update(y, &derivative, &linear, dt),
                    aux,
                }
            })),
            EquationKind::StochasticSingle | EquationKind::StochasticMulti => {
                Err(IntegratorError::UnsupportedEquation {
                    method: METHOD.to_string(),
                    stochastic: true,
                })
            }
        };
    }

    let Some(symbolic) = equation.symbolic() else {
        log::warn!(
            "drift of '{}' carries no linear coefficient; exponential Euler falls back to Euler",
            equation.variable()
        );
        return Ok(ode_euler(equation, dt, params)?.labelled(METHOD));
    };

    let affine = symbolic::decompose(&symbolic.expr, equation.variable());
    let Some(linear) = affine.as_ref().and_then(|a| a.coefficient()) else {
        log::info!(
            "'{}' is not affine in '{}' with a non-zero coefficient; using Euler",
            symbolic.source,
            equation.variable()
        );
        return Ok(ode_euler(equation, dt, params)?.labelled(METHOD));
    };

    let program = symbolic::compile(linear, equation.variable(), equation.args())?;
    match program.constant() {
        Some(a) => {
            let phi_dt = ((a * dt).exp() - 1.0) / a;
            log::debug!("linear coefficient of '{}' is constant: {}", equation.variable(), a);
            deterministic(METHOD, equation, dt, move |_, y, _, _, k1| y + &(k1 * phi_dt))
        }
        None => deterministic(METHOD, equation, dt, move |_, y, t, args, k1| {
            let linear = symbolic::evaluate(&program, y, t, args);
            exponential_update(y, &k1, &linear, dt)
        }),
    }
}

pub fn sde_exponential(equation: &Equation, dt: f64, _params: &SchemeParams) -> IntegratorResult<StepFunction> {
    let Drift::Linearized(f) = equation.drift() else {
        return Err(IntegratorError::MissingLinearCoefficient {
            variable: equation.variable().to_string(),
        });
    };
    let f = f.clone();
    let g = diffusion_of(equation)?.clone();
    let sqrt_dt = dt.sqrt();
    let multi_valued = match equation.kind() {
        EquationKind::StochasticSingle => false,
        EquationKind::StochasticMulti => true,
        EquationKind::DeterministicSingle | EquationKind::DeterministicMulti => {
            return Err(IntegratorError::UnsupportedEquation {
                method: METHOD.to_string(),
                stochastic: false,
            })
        }
    };

    Ok(with_step(METHOD, equation, dt, move |y, t, args, noise| {
        let Linearized { derivative, linear, aux } = f(y, t, args);
        let dw = noise.standard_normal(y.len());
        let g = g.evaluate(y, t, args);
        let state = Array1::from_shape_fn(y.len(), |i| {
            let a = element(&linear, i);
            let decay = (a * dt).exp();
            y[i] + (decay - 1.0) / a * element(&derivative, i) + decay * element(&g, i) * sqrt_dt * dw[i]
        });
        StepOutput {
            state,
            aux: if multi_valued { aux } else { Vec::new() },
        }
    }))
}
