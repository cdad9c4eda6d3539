// src/models/gbm.rs
use super::model::DynamicalModel;
use crate::equation::{Diffusion, Equation, State};
use crate::error::IntegratorResult;
use ndarray::Array1;

/// Geometric Brownian motion `dx = mu x dt + sigma x dW`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gbm {
    pub x0: f64,
    pub mu: f64,
    pub sigma: f64,
}

impl Gbm {
    pub fn new(x0: f64, mu: f64, sigma: f64) -> Self {
        Gbm { x0, mu, sigma }
    }

    /// Exact Itô step driven by the standard-normal draw `z`
    pub fn exact_step(&self, x: f64, dt: f64, z: f64) -> f64 {
        x * ((self.mu - 0.5 * self.sigma * self.sigma) * dt + self.sigma * dt.sqrt() * z).exp()
    }
}

impl DynamicalModel for Gbm {
    fn equation(&self) -> IntegratorResult<Equation> {
        let Gbm { mu, sigma, .. } = *self;
        Equation::sde(
            "x",
            move |y, _, _| y * mu,
            Diffusion::function(move |y, _, _| y * sigma),
        )
    }

    fn initial_state(&self, n: usize) -> State {
        Array1::from_elem(n, self.x0)
    }
}
