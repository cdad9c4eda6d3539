// src/models/ou_process.rs
use super::model::DynamicalModel;
use crate::equation::{Equation, Linearized, State};
use crate::error::{validation::validate_positive, IntegratorResult};
use ndarray::Array1;

/// Ornstein–Uhlenbeck process `dx = (mean - x)/tau dt + sigma dW`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OuProcess {
    pub mean: f64,
    pub sigma: f64,
    pub tau: f64,
}

impl OuProcess {
    pub fn new(mean: f64, sigma: f64, tau: f64) -> Self {
        OuProcess { mean, sigma, tau }
    }

    /// Same process with the drift reporting its linear coefficient `-1/tau`,
    /// as exponential Euler requires for stochastic equations
    pub fn linearized_equation(&self) -> IntegratorResult<Equation> {
        validate_positive("tau", self.tau)?;
        let OuProcess { mean, sigma, tau } = *self;
        Equation::linearized("x", move |y, _, _| {
            Linearized::new(y.mapv(|x| (mean - x) / tau), Array1::from_elem(1, -1.0 / tau))
        })?
        .with_diffusion(sigma)
    }
}

impl DynamicalModel for OuProcess {
    fn equation(&self) -> IntegratorResult<Equation> {
        validate_positive("tau", self.tau)?;
        let OuProcess { mean, sigma, tau } = *self;
        Equation::sde("x", move |y, _, _| y.mapv(|x| (mean - x) / tau), sigma)
    }

    fn initial_state(&self, n: usize) -> State {
        Array1::from_elem(n, self.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegratorError;
    use ndarray::array;

    #[test]
    fn test_drift_and_coefficient() {
        let ou = OuProcess::new(1.0, 0.3, 2.0);
        let eq = ou.linearized_equation().unwrap();
        let y = array![0.0, 3.0];
        assert_eq!(eq.drift().derivative(&y, 0.0, &[]), array![0.5, -1.0]);
        assert!(eq.is_stochastic());
        assert_eq!(ou.equation().unwrap().drift().derivative(&y, 0.0, &[]), array![0.5, -1.0]);
    }

    #[test]
    fn test_invalid_tau() {
        let err = OuProcess::new(0.0, 1.0, 0.0).equation().unwrap_err();
        assert!(matches!(err, IntegratorError::InvalidEquation { .. }));
    }
}
