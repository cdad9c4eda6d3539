// src/solvers/milstein.rs
//! Derivative-free Milstein Schemes
//!
//! # Mathematical Framework
//!
//! The Milstein scheme adds the term `½ g g' [(ΔW)² - Δt]` to Euler–Maruyama.
//! Here `g g'` is replaced by a finite difference along a Runge–Kutta
//! predictor, so no derivative of the diffusion is needed:
//! ```text
//! Ȳ       = y_n + f_n Δt + g_n √Δt
//! y_{n+1} = y_n + f_n Δt + g_n √Δt dW_n + C_n
//! ```
//!
//! with the correction `C_n` depending on the calculus:
//! ```text
//! Itô:           C_n = ½ [g(Ȳ) - g_n] (dW_n² √Δt - √Δt)
//! Stratonovich:  C_n = ½ [g(Ȳ) - g_n]  dW_n² √Δt
//! ```
//!
//! The `-√Δt` term is what separates the two calculi.
//!
//! # Convergence Properties
//!
//! - **Strong convergence**: Order 1.0 (vs 0.5 for Euler–Maruyama)
//! - **Weak convergence**: Order 1.0
//!
//! With a constant diffusion `g(Ȳ) = g_n`, the correction vanishes and both
//! builders return the Euler–Maruyama step.

use super::euler::sde_euler;
use super::{diffusion_of, stochastic, SchemeParams, StepFunction};
use crate::equation::Equation;
use crate::error::IntegratorResult;

/// Stochastic calculus the correction term targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculus {
    Ito,
    Stratonovich,
}

fn build(
    method: &'static str,
    calculus: Calculus,
    equation: &Equation,
    dt: f64,
    params: &SchemeParams,
) -> IntegratorResult<StepFunction> {
    if diffusion_of(equation)?.is_constant() {
        return Ok(sde_euler(equation, dt, params)?.labelled(method));
    }
    let sqrt_dt = dt.sqrt();
    stochastic(method, equation, dt, move |g, stage| {
        let df = stage.f * dt;
        let g_n = g.evaluate(stage.y, stage.t, stage.args);
        let y_bar = stage.y + &df + &(&g_n * sqrt_dt);
        let g_bar = g.evaluate(&y_bar, stage.t, stage.args);

        let dw2 = stage.dw.mapv(|w| w * w * sqrt_dt);
        let weight = match calculus {
            Calculus::Ito => dw2 - sqrt_dt,
            Calculus::Stratonovich => dw2,
        };
        let correction = (g_bar - &g_n) * 0.5 * &weight;
        stage.y + &df + &(g_n * &stage.dw * sqrt_dt) + &correction
    })
}

/// Milstein scheme for Itô equations
pub fn sde_milstein_ito(equation: &Equation, dt: f64, params: &SchemeParams) -> IntegratorResult<StepFunction> {
    build("milstein", Calculus::Ito, equation, dt, params)
}

/// Milstein scheme for Stratonovich equations
pub fn sde_milstein_stratonovich(
    equation: &Equation,
    dt: f64,
    params: &SchemeParams,
) -> IntegratorResult<StepFunction> {
    build("milstein_stra", Calculus::Stratonovich, equation, dt, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation::Diffusion;
    use crate::rng::FixedNoise;
    use ndarray::array;

    fn multiplicative() -> Equation {
        Equation::sde("y", |y, _, _| y * 0.0, Diffusion::function(|y, _, _| y.clone())).unwrap()
    }

    #[test]
    fn test_ito_and_stratonovich_differ_by_sqrt_dt_term() {
        let dt: f64 = 0.04;
        let ito = sde_milstein_ito(&multiplicative(), dt, &SchemeParams::default()).unwrap();
        let stra = sde_milstein_stratonovich(&multiplicative(), dt, &SchemeParams::default()).unwrap();

        let y0 = array![1.0];
        let a = ito.call(&y0, 0.0, &[], &mut FixedNoise::constant(1.5)).state[0];
        let b = stra.call(&y0, 0.0, &[], &mut FixedNoise::constant(1.5)).state[0];

        // g = y, so g(Ȳ) - g_n = √dt and the gap is ½·√dt·√dt
        assert!((b - a - 0.5 * dt).abs() < 1e-14);
    }

    #[test]
    fn test_ito_scripted_step() {
        let dt: f64 = 0.01;
        let step = sde_milstein_ito(&multiplicative(), dt, &SchemeParams::default()).unwrap();
        let out = step.call(&array![2.0], 0.0, &[], &mut FixedNoise::constant(-1.0));

        // Ȳ = 2.2, g_n = 2, dW² - 1 = 0 so only the Euler part remains
        assert!((out.state[0] - 1.8).abs() < 1e-14);
    }

    #[test]
    fn test_constant_diffusion_matches_euler() {
        let eq = Equation::sde("y", |y, _, _| -y, array![0.2, 0.4]).unwrap();
        let ito = sde_milstein_ito(&eq, 0.05, &SchemeParams::default()).unwrap();
        let stra = sde_milstein_stratonovich(&eq, 0.05, &SchemeParams::default()).unwrap();
        let euler = sde_euler(&eq, 0.05, &SchemeParams::default()).unwrap();

        let draws = vec![0.3, -2.1, 1.4, 0.9];
        let y0 = array![1.0, 2.0];
        let expected = euler.call(&y0, 0.0, &[], &mut FixedNoise::new(draws.clone()));
        assert_eq!(ito.call(&y0, 0.0, &[], &mut FixedNoise::new(draws.clone())), expected);
        assert_eq!(stra.call(&y0, 0.0, &[], &mut FixedNoise::new(draws)), expected);
        assert_eq!(stra.method(), "milstein_stra");
    }
}
