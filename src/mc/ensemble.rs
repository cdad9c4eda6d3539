// src/mc/ensemble.rs
//! Trajectory and ensemble drivers.
//!
//! Successive steps of one trajectory are strictly sequential. Independent
//! trajectories run in parallel with rayon, each with its own noise stream
//! from [`RngFactory`], so an ensemble is reproducible for a given seed
//! regardless of thread count.

use crate::equation::State;
use crate::error::{validation::*, IntegratorError, IntegratorResult};
use crate::math_utils::{mean_variance, Timer};
use crate::rng::{NoiseSource, RngFactory};
use crate::solvers::StepFunction;
use rayon::prelude::*;
use statrs::statistics::Statistics;

#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    pub paths: usize,
    pub steps: usize,
    pub t0: f64,
    pub seed: u64,
}

impl EnsembleConfig {
    /// Validate the ensemble configuration
    pub fn validate(&self) -> IntegratorResult<()> {
        validate_paths(self.paths)?;
        validate_steps(self.steps)?;
        if !self.t0.is_finite() {
            return Err(IntegratorError::InvalidConfiguration {
                field: "t0".to_string(),
                reason: format!("must be finite, got {}", self.t0),
            });
        }
        Ok(())
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            paths: 10_000,
            steps: 100,
            t0: 0.0,
            seed: 12345,
        }
    }
}

/// Recorded states, `times[k]` paired with `states[k]`
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<State>,
}

impl Trajectory {
    /// Time series of one element
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.states.iter().map(|s| s[index]).collect()
    }

    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }
}

/// Advance `y0` by `steps` steps from `t0` and return the final state
pub fn run_trajectory(
    step: &StepFunction,
    y0: &State,
    t0: f64,
    steps: usize,
    args: &[State],
    noise: &mut dyn NoiseSource,
) -> State {
    let dt = step.dt();
    let mut y = y0.clone();
    for k in 0..steps {
        y = step.call(&y, t0 + k as f64 * dt, args, noise).state;
    }
    y
}

/// Like [`run_trajectory`], keeping every intermediate state
pub fn record_trajectory(
    step: &StepFunction,
    y0: &State,
    t0: f64,
    steps: usize,
    args: &[State],
    noise: &mut dyn NoiseSource,
) -> Trajectory {
    let dt = step.dt();
    let mut times = Vec::with_capacity(steps + 1);
    let mut states = Vec::with_capacity(steps + 1);
    times.push(t0);
    states.push(y0.clone());

    for k in 0..steps {
        let t = t0 + k as f64 * dt;
        let next = step.call(&states[k], t, args, noise).state;
        times.push(t0 + (k + 1) as f64 * dt);
        states.push(next);
    }
    Trajectory { times, states }
}

/// Final states of `config.paths` independent realisations
pub fn run_ensemble(
    step: &StepFunction,
    y0: &State,
    args: &[State],
    config: &EnsembleConfig,
) -> IntegratorResult<Vec<State>> {
    config.validate()?;
    let factory = RngFactory::new(config.seed);
    let timer = Timer::new();
    log::info!(
        "ensemble: {} paths x {} steps of '{}' ({}) on {} threads",
        config.paths,
        config.steps,
        step.variable(),
        step.method(),
        rayon::current_num_threads()
    );

    let finals: Vec<State> = (0..config.paths)
        .into_par_iter()
        .map(|i| {
            let mut noise = factory.noise_for_path(i as u64);
            run_trajectory(step, y0, config.t0, config.steps, args, &mut noise)
        })
        .collect();

    log::info!("ensemble finished in {:.1} ms", timer.elapsed_ms());
    Ok(finals)
}

/// Moments of one state element across an ensemble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleSummary {
    pub paths: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_error: f64,
    pub min: f64,
    pub max: f64,
}

impl EnsembleSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        let (mean, variance) = mean_variance(samples);
        EnsembleSummary {
            paths: samples.len(),
            mean,
            variance,
            std_error: (variance / samples.len() as f64).sqrt(),
            min: samples.min(),
            max: samples.max(),
        }
    }

    /// Summary of element `index` of every final state
    pub fn of_element(finals: &[State], index: usize) -> Self {
        let samples: Vec<f64> = finals.iter().map(|s| s[index]).collect();
        Self::from_samples(&samples)
    }

    /// Summary over every element of every final state
    pub fn pooled(finals: &[State]) -> Self {
        let samples: Vec<f64> = finals.iter().flat_map(|s| s.iter().copied()).collect();
        Self::from_samples(&samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation::Equation;
    use crate::registry::get_integrator;
    use crate::config::IntegratorConfig;
    use crate::rng::ZeroNoise;
    use ndarray::array;

    #[test]
    fn test_config_validation() {
        assert!(EnsembleConfig::default().validate().is_ok());
        let no_paths = EnsembleConfig {
            paths: 0,
            ..Default::default()
        };
        assert!(no_paths.validate().is_err());
        let no_steps = EnsembleConfig {
            steps: 0,
            ..Default::default()
        };
        assert!(no_steps.validate().is_err());
    }

    #[test]
    fn test_record_matches_run() {
        let eq = Equation::ode("y", |y, t, _| -y + t).unwrap();
        let step = get_integrator("rk3").unwrap().build(&eq, &IntegratorConfig::with_dt(0.05)).unwrap();
        let y0 = array![1.0, -1.0];

        let trajectory = record_trajectory(&step, &y0, 0.5, 40, &[], &mut ZeroNoise);
        let last = run_trajectory(&step, &y0, 0.5, 40, &[], &mut ZeroNoise);
        assert_eq!(trajectory.states.len(), 41);
        assert_eq!(trajectory.last(), Some(&last));
        assert!((trajectory.times[40] - 2.5).abs() < 1e-12);
        assert_eq!(trajectory.component(1)[0], -1.0);
    }

    #[test]
    fn test_ensemble_is_reproducible() {
        let eq = Equation::sde("x", |y, _, _| -y, 0.5).unwrap();
        let step = get_integrator("euler").unwrap().build(&eq, &IntegratorConfig::with_dt(0.01)).unwrap();
        let config = EnsembleConfig {
            paths: 64,
            steps: 20,
            ..Default::default()
        };

        let a = run_ensemble(&step, &array![0.0], &[], &config).unwrap();
        let b = run_ensemble(&step, &array![0.0], &[], &config).unwrap();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);

        let summary = EnsembleSummary::of_element(&a, 0);
        assert_eq!(summary.paths, 64);
        assert!(summary.min <= summary.mean && summary.mean <= summary.max);
    }

    #[test]
    fn test_pooled_summary() {
        let finals = vec![array![1.0, 3.0], array![5.0, 7.0]];
        let pooled = EnsembleSummary::pooled(&finals);
        assert_eq!(pooled.paths, 4);
        assert!((pooled.mean - 4.0).abs() < 1e-12);
        assert_eq!((pooled.min, pooled.max), (1.0, 7.0));

        let second = EnsembleSummary::of_element(&finals, 1);
        assert!((second.mean - 5.0).abs() < 1e-12);
        assert!((second.variance - 8.0).abs() < 1e-12);
    }
}
