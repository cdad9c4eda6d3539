// src/models/fitzhugh_nagumo.rs
use crate::compiler::{StepCompiler, System};
use crate::config::IntegratorConfig;
use crate::equation::Equation;
use crate::error::{validation::validate_positive, IntegratorResult};
use crate::registry::Integrator;
use crate::symbolic::Scope;

/// FitzHugh–Nagumo neuron, two coupled equations
/// ```text
/// dV/dt = V - V³/3 - w + I
/// dw/dt = (V + a - b·w) / tau
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitzHughNagumo {
    pub a: f64,
    pub b: f64,
    pub tau: f64,
}

impl Default for FitzHughNagumo {
    fn default() -> Self {
        FitzHughNagumo {
            a: 0.7,
            b: 0.8,
            tau: 12.5,
        }
    }
}

impl FitzHughNagumo {
    pub fn v_equation(&self) -> IntegratorResult<Equation> {
        Equation::from_expression("V", "V - V^3/3 - w + I", &["w", "I"], Scope::new())
    }

    pub fn w_equation(&self) -> IntegratorResult<Equation> {
        validate_positive("tau", self.tau)?;
        let scope: Scope = [
            ("a".to_string(), self.a),
            ("b".to_string(), self.b),
            ("tau".to_string(), self.tau),
        ]
        .into_iter()
        .collect();
        Equation::from_expression("w", "(V + a - b*w)/tau", &["V"], scope)
    }

    /// Both equations merged into one system; `I` stays an external input
    pub fn system(&self, integrator: &Integrator, config: &IntegratorConfig) -> IntegratorResult<System> {
        let compiler = StepCompiler::new(config.clone())?;
        let mut system = System::new();
        system.add(compiler.compile_unit(integrator, &self.v_equation()?)?)?;
        system.add(compiler.compile_unit(integrator, &self.w_equation()?)?)?;
        Ok(system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::StateMap;
    use crate::registry::get_integrator;
    use crate::rng::ZeroNoise;
    use ndarray::array;

    #[test]
    fn test_relaxes_to_fixed_point_without_input() {
        let model = FitzHughNagumo::default();
        let config = IntegratorConfig::with_dt(0.05);
        let system = model.system(&get_integrator("rk4").unwrap(), &config).unwrap();
        assert_eq!(system.variables().collect::<Vec<_>>(), vec!["V", "w"]);

        let mut states: StateMap = [("V".to_string(), array![0.0]), ("w".to_string(), array![0.0])]
            .into_iter()
            .collect();
        let inputs: StateMap = [("I".to_string(), array![0.0])].into_iter().collect();
        let mut t = 0.0;
        for _ in 0..10_000 {
            system.advance(&mut states, t, &inputs, &mut ZeroNoise).unwrap();
            t += config.dt;
        }

        let (v, w) = (states["V"][0], states["w"][0]);
        assert!((v - v.powi(3) / 3.0 - w).abs() < 1e-6);
        assert!((v + model.a - model.b * w).abs() < 1e-6);
        assert!((v + 1.1994).abs() < 1e-3);
    }

    #[test]
    fn test_missing_input_is_reported() {
        let system = FitzHughNagumo::default()
            .system(&get_integrator("euler").unwrap(), &IntegratorConfig::default())
            .unwrap();
        let states: StateMap = [("V".to_string(), array![0.0]), ("w".to_string(), array![0.0])]
            .into_iter()
            .collect();
        assert!(system.step(&states, 0.0, &StateMap::new(), &mut ZeroNoise).is_err());
    }
}
