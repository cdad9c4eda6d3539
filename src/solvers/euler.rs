// src/solvers/euler.rs
//! Explicit Euler and Euler–Maruyama
//!
//! # Mathematical Framework
//!
//! ```text
//! ODE:  y_{n+1} = y_n + f(y_n, t_n) Δt
//! SDE:  y_{n+1} = y_n + f(y_n, t_n) Δt + g(y_n, t_n) √Δt dW_n,   dW_n ~ N(0, 1)
//! ```
//!
//! # Convergence Properties
//!
//! - **ODE**: global order 1
//! - **SDE strong order**: 0.5 (1.0 for additive noise)
//! - **SDE weak order**: 1.0
//!
//! Euler–Maruyama is also the additive-noise fast path of every other
//! stochastic scheme: with a constant `g` the Heun and Milstein corrections
//! vanish identically.

use super::{deterministic, diffusion_of, stochastic, SchemeParams, StepFunction};
use crate::equation::{Diffusion, Equation};
use crate::error::IntegratorResult;

/// `y1 = y0 + dt·f(y0, t)`
pub fn ode_euler(equation: &Equation, dt: f64, _params: &SchemeParams) -> IntegratorResult<StepFunction> {
    deterministic("euler", equation, dt, move |_, y, _, _, k1| y + &(k1 * dt))
}

/// `y1 = y0 + f·dt + g·√dt·dW`
pub fn sde_euler(equation: &Equation, dt: f64, _params: &SchemeParams) -> IntegratorResult<StepFunction> {
    let sqrt_dt = dt.sqrt();
    // additive noise: √dt folded into the constant once
    let scaled = match diffusion_of(equation)? {
        Diffusion::Function(_) => {
            return stochastic("euler", equation, dt, move |g, stage| {
                let g = g.evaluate(stage.y, stage.t, stage.args);
                stage.y + &(stage.f * dt) + &(g * &stage.dw * sqrt_dt)
            })
        }
        Diffusion::Scalar(v) => Diffusion::Scalar(v * sqrt_dt),
        Diffusion::Array(values) => Diffusion::Array(values * sqrt_dt),
    };
    stochastic("euler", equation, dt, move |_, stage| {
        let g = scaled.evaluate(stage.y, stage.t, stage.args);
        stage.y + &(stage.f * dt) + &(g * &stage.dw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation::MultiReturn;
    use crate::rng::FixedNoise;
    use ndarray::array;

    #[test]
    fn test_ode_euler_single_step() {
        let eq = Equation::ode("y", |y, _, _| -y).unwrap();
        let step = ode_euler(&eq, 0.1, &SchemeParams::default()).unwrap();

        let out = step.call_ode(&array![1.0, 2.0], 0.0, &[]);
        assert!((out.state[0] - 0.9).abs() < 1e-15);
        assert!((out.state[1] - 1.8).abs() < 1e-15);
        assert!(out.aux.is_empty());
    }

    #[test]
    fn test_ode_euler_uses_args() {
        let eq = Equation::ode("v", |y, _, args| &args[0] - y)
            .unwrap()
            .with_args(&["I"])
            .unwrap();
        let step = ode_euler(&eq, 0.5, &SchemeParams::default()).unwrap();

        let out = step.call_ode(&array![0.0], 0.0, &[array![2.0]]);
        assert_eq!(out.state, array![1.0]);
    }

    #[test]
    fn test_ode_euler_multi_valued() {
        let eq = Equation::ode_multi("y", |y, _, _| MultiReturn::new(-y, vec![y * 10.0])).unwrap();
        let step = ode_euler(&eq, 0.1, &SchemeParams::default()).unwrap();

        let out = step.call_ode(&array![1.0], 0.0, &[]);
        assert_eq!(out.aux, vec![array![10.0]]);
    }

    #[test]
    fn test_sde_euler_scripted_noise() {
        // f = -y, g = 0.5·y, dW = 2
        let eq = Equation::sde("y", |y, _, _| -y, Diffusion::function(|y, _, _| y * 0.5)).unwrap();
        let step = sde_euler(&eq, 0.04, &SchemeParams::default()).unwrap();

        let out = step.call(&array![1.0], 0.0, &[], &mut FixedNoise::constant(2.0));
        let expected = 1.0 - 0.04 + 0.5 * 0.2 * 2.0;
        assert!((out.state[0] - expected).abs() < 1e-14);
    }

    #[test]
    fn test_sde_euler_additive_array() {
        let eq = Equation::sde("y", |y, _, _| y * 0.0, array![1.0, 2.0]).unwrap();
        let step = sde_euler(&eq, 0.25, &SchemeParams::default()).unwrap();

        let mut noise = FixedNoise::new(vec![1.0, -1.0]);
        let out = step.call(&array![0.0, 0.0], 0.0, &[], &mut noise);
        assert_eq!(out.state, array![0.5, -1.0]);
        assert_eq!(noise.drawn(), 2);
    }
}
