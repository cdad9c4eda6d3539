// src/compiler.rs
//! Step-Function Compiler
//!
//! Finalises what a scheme builder produced:
//!
//! ```text
//! Equation ──(fold constants)──► builder(dt, params) ──► StepFunction
//!                                                        │
//!                               MergeMode::Merge ────────┴──► IntegratorUnit ──► System
//! ```
//!
//! `dt` and constant diffusions are captured by the builder closures, so
//! nothing is re-read per call. In merge mode each unit keeps its own closure,
//! and the unit-local constants of a symbolic equation are renamed into a
//! `_<variable>_` namespace so two units never claim the same name.

use crate::config::{CompileFlags, IntegratorConfig, MergeMode};
use crate::equation::{Equation, State};
use crate::error::{IntegratorError, IntegratorResult};
use crate::registry::Integrator;
use crate::rng::NoiseSource;
use crate::solvers::{StepFunction, StepOutput};
use crate::symbolic::{Expr, Scope};
use std::collections::{BTreeMap, HashMap};

/// Named state or input arrays
pub type StateMap = BTreeMap<String, State>;

/// Result of compiling one equation
#[derive(Debug, Clone)]
pub enum Built {
    Function(StepFunction),
    Unit(IntegratorUnit),
}

impl Built {
    pub fn into_function(self) -> StepFunction {
        match self {
            Built::Function(step) => step,
            Built::Unit(unit) => unit.step,
        }
    }

    pub fn into_unit(self) -> Option<IntegratorUnit> {
        match self {
            Built::Unit(unit) => Some(unit),
            Built::Function(_) => None,
        }
    }
}

/// Step function prepared for a combined update
#[derive(Debug, Clone)]
pub struct IntegratorUnit {
    namespace: String,
    step: StepFunction,
    args: Vec<String>,
    symbols: Scope,
    expression: Option<Expr>,
}

impl IntegratorUnit {
    fn new(step: StepFunction, equation: &Equation, flags: CompileFlags) -> Self {
        let namespace = format!("_{}_", equation.variable());
        let isolate = flags.contains(CompileFlags::ISOLATE_NAMES);

        let mut renames = HashMap::new();
        let mut symbols = Scope::new();
        if let Some(symbolic) = equation.symbolic() {
            for name in symbolic.unbound.symbols() {
                let Some(value) = equation.scope().get(&name) else {
                    continue;
                };
                let local = if isolate {
                    format!("{}{}", namespace, name)
                } else {
                    name.clone()
                };
                symbols.insert(local.clone(), *value);
                renames.insert(name, local);
            }
        }
        let expression = equation
            .symbolic()
            .map(|symbolic| symbolic.unbound.substitute(&renames));

        Self {
            namespace,
            step,
            args: equation.args().to_vec(),
            symbols,
            expression,
        }
    }

    pub fn variable(&self) -> &str {
        self.step.variable()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Argument names resolved against the system's states and inputs
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Unit-local constants, under their (possibly namespaced) names
    pub fn symbols(&self) -> &Scope {
        &self.symbols
    }

    /// Drift expression with unit-local constants renamed
    pub fn expression(&self) -> Option<&Expr> {
        self.expression.as_ref()
    }

    pub fn step(&self) -> &StepFunction {
        &self.step
    }
}

/// Turns equations into step functions or mergeable units
#[derive(Debug, Clone)]
pub struct StepCompiler {
    config: IntegratorConfig,
}

impl StepCompiler {
    pub fn new(config: IntegratorConfig) -> IntegratorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    fn prepare(&self, integrator: &Integrator, equation: &Equation) -> IntegratorResult<(StepFunction, Equation)> {
        let prepared = if self.config.flags.contains(CompileFlags::FOLD_CONSTANTS) {
            equation.folded()?
        } else {
            equation.clone()
        };
        let builder = integrator.builder_for(&prepared)?;
        let step = builder(&prepared, self.config.dt, integrator.params())?;
        Ok((step, prepared))
    }

    /// Build according to the configured merge mode
    pub fn compile(&self, integrator: &Integrator, equation: &Equation) -> IntegratorResult<Built> {
        let (step, prepared) = self.prepare(integrator, equation)?;
        Ok(match self.config.merge_mode {
            MergeMode::Standalone => Built::Function(step),
            MergeMode::Merge => Built::Unit(IntegratorUnit::new(step, &prepared, self.config.flags)),
        })
    }

    /// Build a mergeable unit whatever the merge mode
    pub fn compile_unit(&self, integrator: &Integrator, equation: &Equation) -> IntegratorResult<IntegratorUnit> {
        let (step, prepared) = self.prepare(integrator, equation)?;
        Ok(IntegratorUnit::new(step, &prepared, self.config.flags))
    }
}

/// Several merged units advanced together.
///
/// Every unit of a tick reads the states of the previous tick, so units are
/// independent within a tick and their order only fixes the order in which
/// noise is drawn.
#[derive(Debug, Clone, Default)]
pub struct System {
    units: Vec<IntegratorUnit>,
    symbols: Scope,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, unit: IntegratorUnit) -> IntegratorResult<()> {
        let collision = |name: &str| IntegratorError::NameCollision {
            name: name.to_string(),
        };
        let variable = unit.variable();
        if self.units.iter().any(|u| u.variable() == variable) || self.symbols.contains_key(variable) {
            return Err(collision(variable));
        }
        for (name, value) in &unit.symbols {
            let clashes_with_state =
                name == variable || self.units.iter().any(|u| u.variable() == name);
            let clashes_with_symbol = matches!(self.symbols.get(name), Some(v) if v != value);
            if clashes_with_state || clashes_with_symbol {
                return Err(collision(name));
            }
        }

        self.symbols
            .extend(unit.symbols.iter().map(|(k, v)| (k.clone(), *v)));
        log::debug!(
            "merged '{}' ({}) into system of {} unit(s)",
            variable,
            unit.step.method(),
            self.units.len() + 1
        );
        self.units.push(unit);
        Ok(())
    }

    pub fn units(&self) -> &[IntegratorUnit] {
        &self.units
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.units.iter().map(|u| u.variable())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn lookup<'a>(
        unit: &IntegratorUnit,
        name: &str,
        states: &'a StateMap,
        inputs: &'a StateMap,
    ) -> IntegratorResult<&'a State> {
        states
            .get(name)
            .or_else(|| inputs.get(name))
            .ok_or_else(|| IntegratorError::UnboundArgument {
                variable: unit.variable().to_string(),
                argument: name.to_string(),
            })
    }

    /// One tick of every unit; `states` is left untouched
    pub fn step(
        &self,
        states: &StateMap,
        t: f64,
        inputs: &StateMap,
        noise: &mut dyn NoiseSource,
    ) -> IntegratorResult<BTreeMap<String, StepOutput>> {
        let mut outputs = BTreeMap::new();
        for unit in &self.units {
            let y = states
                .get(unit.variable())
                .ok_or_else(|| IntegratorError::UnboundArgument {
                    variable: unit.variable().to_string(),
                    argument: unit.variable().to_string(),
                })?;
            let args = unit
                .args
                .iter()
                .map(|name| Self::lookup(unit, name, states, inputs).cloned())
                .collect::<IntegratorResult<Vec<_>>>()?;
            outputs.insert(unit.variable().to_string(), unit.step.try_call(y, t, &args, noise)?);
        }
        Ok(outputs)
    }

    /// One tick, writing the new states back; returns the auxiliary outputs
    pub fn advance(
        &self,
        states: &mut StateMap,
        t: f64,
        inputs: &StateMap,
        noise: &mut dyn NoiseSource,
    ) -> IntegratorResult<BTreeMap<String, Vec<State>>> {
        let outputs = self.step(states, t, inputs, noise)?;
        let mut aux = BTreeMap::new();
        for (variable, output) in outputs {
            aux.insert(variable.clone(), output.aux);
            states.insert(variable, output.state);
        }
        Ok(aux)
    }
}
