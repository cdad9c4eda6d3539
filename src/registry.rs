// src/registry.rs
//! Scheme registry: method name → builders.
//!
//! Names are matched case-insensitively against each entry's canonical name
//! and its aliases. An entry may lack a deterministic or a stochastic builder;
//! asking for the missing one fails when the integrator is built.

use crate::config::IntegratorConfig;
use crate::equation::Equation;
use crate::error::{validation::validate_nonzero, IntegratorError, IntegratorResult};
use crate::solvers::{
    euler, exponential, heun, milstein, runge_kutta, Builder, SchemeParams, StepFunction,
};
use std::fmt;

/// One registered scheme
pub struct SchemeEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub deterministic: Option<Builder>,
    pub stochastic: Option<Builder>,
}

impl fmt::Debug for SchemeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeEntry")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("deterministic", &self.deterministic.is_some())
            .field("stochastic", &self.stochastic.is_some())
            .finish()
    }
}

impl SchemeEntry {
    fn matches(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }
}

pub static SCHEMES: &[SchemeEntry] = &[
    SchemeEntry {
        name: "euler",
        aliases: &["explicit_euler", "euler_maruyama"],
        deterministic: Some(euler::ode_euler),
        stochastic: Some(euler::sde_euler),
    },
    SchemeEntry {
        name: "midpoint",
        aliases: &["modified_euler"],
        deterministic: Some(runge_kutta::ode_midpoint),
        stochastic: None,
    },
    SchemeEntry {
        name: "heun",
        aliases: &[],
        deterministic: Some(runge_kutta::ode_heun),
        stochastic: Some(heun::sde_heun),
    },
    SchemeEntry {
        name: "rk2",
        aliases: &[],
        deterministic: Some(runge_kutta::ode_rk2),
        stochastic: None,
    },
    SchemeEntry {
        name: "rk3",
        aliases: &[],
        deterministic: Some(runge_kutta::ode_rk3),
        stochastic: None,
    },
    SchemeEntry {
        name: "rk4",
        aliases: &[],
        deterministic: Some(runge_kutta::ode_rk4),
        stochastic: None,
    },
    SchemeEntry {
        name: "rk4_alternative",
        aliases: &["rk4_38"],
        deterministic: Some(runge_kutta::ode_rk4_alternative),
        stochastic: None,
    },
    SchemeEntry {
        name: "exponential",
        aliases: &["exponential_euler", "exp_euler"],
        deterministic: Some(exponential::ode_exponential),
        stochastic: Some(exponential::sde_exponential),
    },
    SchemeEntry {
        name: "milstein",
        aliases: &["milstein_ito"],
        deterministic: None,
        stochastic: Some(milstein::sde_milstein_ito),
    },
    SchemeEntry {
        name: "milstein_stra",
        aliases: &["milstein_stratonovich"],
        deterministic: None,
        stochastic: Some(milstein::sde_milstein_stratonovich),
    },
];

/// Every accepted method name, canonical names first
pub fn method_names() -> Vec<String> {
    let canonical = SCHEMES.iter().map(|entry| entry.name);
    let aliases = SCHEMES.iter().flat_map(|entry| entry.aliases.iter().copied());
    canonical.chain(aliases).map(str::to_string).collect()
}

/// Resolved scheme, ready to build step functions
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    entry: &'static SchemeEntry,
    params: SchemeParams,
}

impl Integrator {
    pub fn name(&self) -> &'static str {
        self.entry.name
    }

    pub fn entry(&self) -> &'static SchemeEntry {
        self.entry
    }

    pub fn params(&self) -> &SchemeParams {
        &self.params
    }

    /// Set the RK2 stage parameter; only `rk2` takes one, and zero or
    /// non-finite values are rejected
    pub fn with_beta(mut self, beta: f64) -> IntegratorResult<Self> {
        if self.entry.name != "rk2" {
            return Err(IntegratorError::InvalidSchemeParameter {
                parameter: "beta".to_string(),
                value: beta,
                constraint: format!("only the rk2 scheme takes beta, not '{}'", self.entry.name),
            });
        }
        validate_nonzero("beta", beta)?;
        self.params.beta = Some(beta);
        Ok(self)
    }

    pub fn supports(&self, stochastic: bool) -> bool {
        if stochastic {
            self.entry.stochastic.is_some()
        } else {
            self.entry.deterministic.is_some()
        }
    }

    /// Builder for the calculus of `equation`
    pub fn builder_for(&self, equation: &Equation) -> IntegratorResult<Builder> {
        let stochastic = equation.is_stochastic();
        let builder = if stochastic {
            self.entry.stochastic
        } else {
            self.entry.deterministic
        };
        builder.ok_or_else(|| IntegratorError::UnsupportedEquation {
            method: self.entry.name.to_string(),
            stochastic,
        })
    }

    /// Build a standalone step function with `config.dt`
    pub fn build(&self, equation: &Equation, config: &IntegratorConfig) -> IntegratorResult<StepFunction> {
        config.validate()?;
        let builder = self.builder_for(equation)?;
        builder(equation, config.dt, &self.params)
    }
}

/// Resolve a method name, ignoring case
pub fn get_integrator(method: &str) -> IntegratorResult<Integrator> {
    let key = method.trim().to_lowercase();
    SCHEMES
        .iter()
        .find(|entry| entry.matches(&key))
        .map(|entry| Integrator {
            entry,
            params: SchemeParams::default(),
        })
        .ok_or_else(|| IntegratorError::UnknownIntegrationMethod {
            method: method.to_string(),
            valid: method_names(),
        })
}
