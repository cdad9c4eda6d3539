// src/solvers/runge_kutta.rs
//! Explicit Runge–Kutta Family for Deterministic Equations
//!
//! # Two-stage (parametric)
//!
//! ```text
//! k1 = f(y0, t)
//! k2 = f(y0 + β·dt·k1, t + β·dt)
//! y1 = y0 + dt·[(1 - 1/(2β))·k1 + 1/(2β)·k2]
//! ```
//! β = 1/2 is the explicit midpoint rule, β = 1 is Heun's method and
//! β = 2/3 (Ralston) is the default of the parametric `rk2` entry.
//!
//! # Three-stage (Kutta)
//!
//! ```text
//! k2 = f(y0 + dt/2·k1, t + dt/2)
//! k3 = f(y0 - dt·k1 + 2dt·k2, t + dt)
//! y1 = y0 + dt/6·(k1 + 4k2 + k3)
//! ```
//!
//! # Four-stage
//!
//! Classic RK4 (weights 1, 2, 2, 1 over 6) and the 3/8 rule with stage points
//! `t + dt/3`, `t + 2dt/3`, `t + dt` (weights 1, 3, 3, 1 over 8).
//!
//! For multi-valued drifts only the derivative enters the stage arithmetic;
//! the auxiliary values returned are those of the first stage.

use super::{deterministic, SchemeParams, StepFunction};
use crate::equation::{Drift, Equation, State};
use crate::error::{validation::validate_nonzero, IntegratorResult};

/// Ralston's choice, minimising the truncation error bound
pub const DEFAULT_RK2_BETA: f64 = 2.0 / 3.0;

fn rk2_update(drift: &Drift, y: &State, t: f64, args: &[State], k1: State, dt: f64, beta: f64) -> State {
    let k2 = drift.derivative(&(y + &(&k1 * (beta * dt))), t + beta * dt, args);
    let w2 = 1.0 / (2.0 * beta);
    y + &((k1 * (1.0 - w2) + k2 * w2) * dt)
}

fn build_rk2(
    method: &'static str,
    equation: &Equation,
    dt: f64,
    beta: f64,
) -> IntegratorResult<StepFunction> {
    validate_nonzero("beta", beta)?;
    deterministic(method, equation, dt, move |drift, y, t, args, k1| {
        rk2_update(drift, y, t, args, k1, dt, beta)
    })
}

/// Parametric RK2; `params.beta` defaults to [`DEFAULT_RK2_BETA`]
pub fn ode_rk2(equation: &Equation, dt: f64, params: &SchemeParams) -> IntegratorResult<StepFunction> {
    build_rk2("rk2", equation, dt, params.beta.unwrap_or(DEFAULT_RK2_BETA))
}

/// Explicit midpoint: RK2 with β = 1/2
pub fn ode_midpoint(equation: &Equation, dt: f64, _params: &SchemeParams) -> IntegratorResult<StepFunction> {
    build_rk2("midpoint", equation, dt, 0.5)
}

/// Heun's method: RK2 with β = 1
pub fn ode_heun(equation: &Equation, dt: f64, _params: &SchemeParams) -> IntegratorResult<StepFunction> {
    build_rk2("heun", equation, dt, 1.0)
}

pub fn ode_rk3(equation: &Equation, dt: f64, _params: &SchemeParams) -> IntegratorResult<StepFunction> {
    deterministic("rk3", equation, dt, move |drift, y, t, args, k1| {
        let k2 = drift.derivative(&(y + &(&k1 * (dt / 2.0))), t + dt / 2.0, args);
        let k3 = drift.derivative(&(y - &(&k1 * dt) + &(&k2 * (2.0 * dt))), t + dt, args);
        y + &((k1 + k2 * 4.0 + k3) * (dt / 6.0))
    })
}

pub fn ode_rk4(equation: &Equation, dt: f64, _params: &SchemeParams) -> IntegratorResult<StepFunction> {
    deterministic("rk4", equation, dt, move |drift, y, t, args, k1| {
        let half = dt / 2.0;
        let k2 = drift.derivative(&(y + &(&k1 * half)), t + half, args);
        let k3 = drift.derivative(&(y + &(&k2 * half)), t + half, args);
        let k4 = drift.derivative(&(y + &(&k3 * dt)), t + dt, args);
        y + &((k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0))
    })
}

/// RK4 3/8 rule
pub fn ode_rk4_alternative(
    equation: &Equation,
    dt: f64,
    _params: &SchemeParams,
) -> IntegratorResult<StepFunction> {
    deterministic("rk4_alternative", equation, dt, move |drift, y, t, args, k1| {
        let k2 = drift.derivative(&(y + &(&k1 * (dt / 3.0))), t + dt / 3.0, args);
        let k3 = drift.derivative(
            &(y - &(&k1 * (dt / 3.0)) + &(&k2 * dt)),
            t + 2.0 * dt / 3.0,
            args,
        );
        let k4 = drift.derivative(
            &(y + &(&k1 * dt) - &(&k2 * dt) + &(&k3 * dt)),
            t + dt,
            args,
        );
        y + &((k1 + k2 * 3.0 + k3 * 3.0 + k4) * (dt / 8.0))
    })
}
