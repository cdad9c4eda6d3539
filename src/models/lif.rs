// src/models/lif.rs
//! Leaky integrate-and-fire neurons
//!
//! The membrane equation is written symbolically,
//! ```text
//! dV/dt = (-(V - V_rest) + R·I) / tau
//! ```
//! so it is affine in `V` and exponential Euler integrates it exactly for
//! piecewise-constant input. Spiking is a plain threshold check after each
//! step followed by a reset and an absolute refractory period.

use super::model::DynamicalModel;
use crate::config::IntegratorConfig;
use crate::equation::{Equation, State};
use crate::error::{validation::validate_positive, IntegratorError, IntegratorResult};
use crate::registry::Integrator;
use crate::rng::NoiseSource;
use crate::solvers::StepFunction;
use crate::symbolic::Scope;
use ndarray::Array1;

pub const MEMBRANE_EQUATION: &str = "(-(V - V_rest) + R*I)/tau";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lif {
    pub v_rest: f64,
    pub v_reset: f64,
    pub v_threshold: f64,
    pub r: f64,
    pub tau: f64,
    pub t_refractory: f64,
}

impl Default for Lif {
    fn default() -> Self {
        Lif {
            v_rest: 0.0,
            v_reset: -5.0,
            v_threshold: 20.0,
            r: 1.0,
            tau: 10.0,
            t_refractory: 1.0,
        }
    }
}

impl Lif {
    pub fn validate(&self) -> IntegratorResult<()> {
        validate_positive("tau", self.tau)?;
        if !self.t_refractory.is_finite() || self.t_refractory < 0.0 {
            return Err(IntegratorError::InvalidEquation {
                field: "t_refractory".to_string(),
                reason: format!("must be non-negative, got {}", self.t_refractory),
            });
        }
        if self.v_reset >= self.v_threshold {
            return Err(IntegratorError::InvalidEquation {
                field: "v_reset".to_string(),
                reason: format!(
                    "reset ({}) must lie below threshold ({})",
                    self.v_reset, self.v_threshold
                ),
            });
        }
        Ok(())
    }

    pub fn scope(&self) -> Scope {
        [
            ("V_rest".to_string(), self.v_rest),
            ("R".to_string(), self.r),
            ("tau".to_string(), self.tau),
        ]
        .into_iter()
        .collect()
    }

    /// Steady-state potential for a constant input current
    pub fn steady_state(&self, current: f64) -> f64 {
        self.v_rest + self.r * current
    }
}

impl DynamicalModel for Lif {
    fn equation(&self) -> IntegratorResult<Equation> {
        self.validate()?;
        Equation::from_expression("V", MEMBRANE_EQUATION, &["I"], self.scope())
    }

    fn initial_state(&self, n: usize) -> State {
        Array1::from_elem(n, self.v_reset)
    }
}

/// Population of identical LIF neurons sharing one step function
#[derive(Debug, Clone)]
pub struct LifGroup {
    params: Lif,
    step: StepFunction,
    pub v: State,
    pub t_last_spike: State,
    pub spike: Vec<bool>,
    pub refractory: Vec<bool>,
}

impl LifGroup {
    pub fn new(
        params: Lif,
        size: usize,
        integrator: &Integrator,
        config: &IntegratorConfig,
    ) -> IntegratorResult<Self> {
        let step = integrator.build(&params.equation()?, config)?;
        Ok(LifGroup {
            params,
            step,
            v: params.initial_state(size),
            t_last_spike: Array1::from_elem(size, -1e7),
            spike: vec![false; size],
            refractory: vec![false; size],
        })
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    pub fn step_function(&self) -> &StepFunction {
        &self.step
    }

    /// Advance every neuron from `t` with input current `input` (length 1 or
    /// the group size). Returns the number of neurons that fired.
    pub fn update(&mut self, t: f64, input: &State, noise: &mut dyn NoiseSource) -> usize {
        let next = self.step.call(&self.v, t, std::slice::from_ref(input), noise).state;
        let mut fired = 0;
        for i in 0..self.len() {
            if t - self.t_last_spike[i] <= self.params.t_refractory {
                self.refractory[i] = true;
                self.spike[i] = false;
            } else if next[i] >= self.params.v_threshold {
                self.v[i] = self.params.v_reset;
                self.t_last_spike[i] = t;
                self.spike[i] = true;
                self.refractory[i] = true;
                fired += 1;
            } else {
                self.v[i] = next[i];
                self.spike[i] = false;
                self.refractory[i] = false;
            }
        }
        fired
    }
}
