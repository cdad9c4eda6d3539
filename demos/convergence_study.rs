// demos/convergence_study.rs
//! Empirical convergence orders of every registered scheme.
//!
//! Deterministic schemes are measured on `dy/dt = -y + sin(t)` by Richardson
//! extrapolation (no exact solution needed). Stochastic schemes are measured
//! by their strong error on geometric Brownian motion against the exact
//! solution driven by the same draws.

use ndarray::array;
use neurint::math_utils::{observed_order, richardson_order};
use neurint::mc::ensemble::run_trajectory;
use neurint::models::{DynamicalModel, Gbm};
use neurint::rng::{FixedNoise, GaussianNoise, NoiseSource, ZeroNoise};
use neurint::{get_integrator, Equation, IntegratorConfig, IntegratorResult};

fn main() -> IntegratorResult<()> {
    println!("neurint Convergence Study");
    println!("=========================\n");
    deterministic_orders()?;
    strong_orders()?;
    Ok(())
}

fn deterministic_orders() -> IntegratorResult<()> {
    let equation = Equation::ode("y", |y, t, _| y.mapv(|v| -v + t.sin()))?;
    let t_end = 2.0;
    let base_steps = 8;

    println!("Deterministic schemes, dy/dt = -y + sin(t), T = {}", t_end);
    println!("{:<18} {:>10} {:>10} {:>10}", "Method", "Declared", "Observed", "y(T)");
    for (method, declared) in [
        ("euler", 1),
        ("midpoint", 2),
        ("heun", 2),
        ("rk2", 2),
        ("rk3", 3),
        ("rk4", 4),
        ("rk4_alternative", 4),
    ] {
        let integrator = get_integrator(method)?;
        let mut finals = Vec::new();
        for level in 0..3 {
            let steps = base_steps << level;
            let dt = t_end / steps as f64;
            let step = integrator.build(&equation, &IntegratorConfig::with_dt(dt))?;
            finals.push(run_trajectory(&step, &array![1.0], 0.0, steps, &[], &mut ZeroNoise)[0]);
        }
        let order = richardson_order(finals[0], finals[1], finals[2], 2.0);
        println!("{:<18} {:>10} {:>10.3} {:>10.6}", method, declared, order, finals[2]);
    }
    println!();
    Ok(())
}

fn strong_orders() -> IntegratorResult<()> {
    let gbm = Gbm::new(1.0, 0.05, 0.8);
    let equation = gbm.equation()?;
    let t_end = 1.0;
    let paths = 2_000;
    let finest = 1024;

    println!("Stochastic schemes, GBM mu = {}, sigma = {}", gbm.mu, gbm.sigma);
    println!("{:<14} {:>8} {:>14} {:>10}", "Method", "Steps", "Strong Error", "Order");
    for method in ["euler", "milstein"] {
        let integrator = get_integrator(method)?;
        let mut previous: Option<f64> = None;
        for steps in [32usize, 64, 128, 256] {
            let dt = t_end / steps as f64;
            let step = integrator.build(&equation, &IntegratorConfig::with_dt(dt))?;
            let stride = finest / steps;

            let mut error = 0.0;
            for path in 0..paths {
                // coarse increments are sums of the fine ones, rescaled to N(0, 1)
                let fine = GaussianNoise::seeded(path).standard_normal(finest);
                let coarse: Vec<f64> = fine
                    .exact_chunks(stride)
                    .into_iter()
                    .map(|chunk| chunk.sum() / (stride as f64).sqrt())
                    .collect();
                let reference = coarse
                    .iter()
                    .fold(gbm.x0, |x, &z| gbm.exact_step(x, dt, z));
                let y = run_trajectory(
                    &step,
                    &gbm.initial_state(1),
                    0.0,
                    steps,
                    &[],
                    &mut FixedNoise::new(coarse),
                );
                error += (y[0] - reference).abs();
            }
            let error = error / paths as f64;
            let order = previous.map_or("-".to_string(), |p| format!("{:.3}", observed_order(p, error, 2.0)));
            println!("{:<14} {:>8} {:>14.6} {:>10}", method, steps, error, order);
            previous = Some(error);
        }
    }
    Ok(())
}
