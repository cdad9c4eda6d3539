// src/solvers/mod.rs
//! Scheme builders and the step functions they produce.
//!
//! Every builder has the same shape:
//! ```text
//! (equation, dt, params) -> StepFunction
//! ```
//! and picks one closure per [`EquationKind`] when it runs, so the returned
//! step function never inspects the equation again. `dt` and any constant
//! diffusion are captured by value. Randomness comes from the
//! [`NoiseSource`] passed to each call.

pub mod euler;
pub mod exponential;
pub mod heun;
pub mod milstein;
pub mod runge_kutta;

use crate::equation::{Diffusion, Drift, Equation, EquationKind, State};
use crate::error::{IntegratorError, IntegratorResult};
use crate::rng::{NoiseSource, ZeroNoise};
use std::fmt;
use std::sync::Arc;

/// Next state plus the auxiliary values of the first stage
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub state: State,
    pub aux: Vec<State>,
}

impl StepOutput {
    pub fn single(state: State) -> Self {
        Self {
            state,
            aux: Vec::new(),
        }
    }
}

/// Type-erased one-step update
pub type StepClosure =
    Arc<dyn Fn(&State, f64, &[State], &mut dyn NoiseSource) -> StepOutput + Send + Sync>;

/// Builder signature shared by every scheme
pub type Builder = fn(&Equation, f64, &SchemeParams) -> IntegratorResult<StepFunction>;

/// Free parameters of parametric schemes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SchemeParams {
    /// RK2 stage position; `None` selects the scheme's own default
    pub beta: Option<f64>,
}

fn step_closure<F>(f: F) -> StepClosure
where
    F: Fn(&State, f64, &[State], &mut dyn NoiseSource) -> StepOutput + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Immutable one-step integrator for a single state variable
#[derive(Clone)]
pub struct StepFunction {
    method: &'static str,
    variable: String,
    dt: f64,
    kind: EquationKind,
    arity: usize,
    step: StepClosure,
}

impl StepFunction {
    pub(crate) fn new(method: &'static str, equation: &Equation, dt: f64, step: StepClosure) -> Self {
        log::debug!(
            "built '{}' step for '{}' ({:?}, dt = {})",
            method,
            equation.variable(),
            equation.kind(),
            dt
        );
        Self {
            method,
            variable: equation.variable().to_string(),
            dt,
            kind: equation.kind(),
            arity: equation.args().len(),
            step,
        }
    }

    /// Report a delegated builder under the requested scheme name
    pub(crate) fn labelled(mut self, method: &'static str) -> Self {
        self.method = method;
        self
    }

    /// Advance `y` by one step from time `t`
    ///
    /// # Panics
    ///
    /// Panics if fewer than [`arity`](Self::arity) arguments are passed; use
    /// [`try_call`](Self::try_call) to get an error instead.
    pub fn call(&self, y: &State, t: f64, args: &[State], noise: &mut dyn NoiseSource) -> StepOutput {
        assert!(
            args.len() >= self.arity,
            "'{}' step for '{}' expects {} argument(s), got {}",
            self.method,
            self.variable,
            self.arity,
            args.len()
        );
        (self.step)(y, t, args, noise)
    }

    /// Like [`call`](Self::call), but a short argument list is an error
    pub fn try_call(
        &self,
        y: &State,
        t: f64,
        args: &[State],
        noise: &mut dyn NoiseSource,
    ) -> IntegratorResult<StepOutput> {
        if args.len() < self.arity {
            return Err(IntegratorError::InvalidEquation {
                field: "args".to_string(),
                reason: format!(
                    "'{}' expects {} argument(s), got {}",
                    self.variable,
                    self.arity,
                    args.len()
                ),
            });
        }
        Ok((self.step)(y, t, args, noise))
    }

    /// Advance a deterministic equation; no noise is drawn
    pub fn call_ode(&self, y: &State, t: f64, args: &[State]) -> StepOutput {
        self.call(y, t, args, &mut ZeroNoise)
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn kind(&self) -> EquationKind {
        self.kind
    }

    /// Number of declared arguments
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_stochastic(&self) -> bool {
        self.kind.is_stochastic()
    }
}

impl fmt::Debug for StepFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepFunction")
            .field("method", &self.method)
            .field("variable", &self.variable)
            .field("dt", &self.dt)
            .field("kind", &self.kind)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Assemble a deterministic step from a scheme update.
///
/// `update(drift, y, t, args, k1)` receives the first-stage derivative and
/// returns the next state; auxiliary values of that first stage are passed
/// through for multi-valued drifts.
pub(crate) fn deterministic<U>(
    method: &'static str,
    equation: &Equation,
    dt: f64,
    update: U,
) -> IntegratorResult<StepFunction>
where
    U: Fn(&Drift, &State, f64, &[State], State) -> State + Send + Sync + 'static,
{
    let drift = equation.drift().clone();
    let step = match equation.kind() {
        EquationKind::DeterministicSingle => step_closure(move |y, t, args, _noise| {
            let k1 = drift.derivative(y, t, args);
            StepOutput::single(update(&drift, y, t, args, k1))
        }),
        EquationKind::DeterministicMulti => step_closure(move |y, t, args, _noise| {
            let (k1, aux) = drift.evaluate(y, t, args);
            StepOutput {
                state: update(&drift, y, t, args, k1),
                aux,
            }
        }),
        EquationKind::StochasticSingle | EquationKind::StochasticMulti => {
            return Err(IntegratorError::UnsupportedEquation {
                method: method.to_string(),
                stochastic: true,
            })
        }
    };
    Ok(StepFunction::new(method, equation, dt, step))
}

/// Arguments of one stochastic update
pub(crate) struct SdeStage<'a> {
    pub y: &'a State,
    pub t: f64,
    pub args: &'a [State],
    /// Drift at `(y, t)`
    pub f: State,
    /// Standard-normal draw, one per element
    pub dw: State,
}

/// Assemble a stochastic step from a scheme update; the noise draw and the
/// first drift evaluation are shared by every scheme.
pub(crate) fn stochastic<U>(
    method: &'static str,
    equation: &Equation,
    dt: f64,
    update: U,
) -> IntegratorResult<StepFunction>
where
    U: Fn(&Diffusion, SdeStage<'_>) -> State + Send + Sync + 'static,
{
    let drift = equation.drift().clone();
    let diffusion = diffusion_of(equation)?.clone();
    let step = match equation.kind() {
        EquationKind::StochasticSingle => step_closure(move |y, t, args, noise| {
            let f = drift.derivative(y, t, args);
            let dw = noise.standard_normal(y.len());
            StepOutput::single(update(&diffusion, SdeStage { y, t, args, f, dw }))
        }),
        EquationKind::StochasticMulti => step_closure(move |y, t, args, noise| {
            let (f, aux) = drift.evaluate(y, t, args);
            let dw = noise.standard_normal(y.len());
            StepOutput {
                state: update(&diffusion, SdeStage { y, t, args, f, dw }),
                aux,
            }
        }),
        EquationKind::DeterministicSingle | EquationKind::DeterministicMulti => {
            return Err(IntegratorError::UnsupportedEquation {
                method: method.to_string(),
                stochastic: false,
            })
        }
    };
    Ok(StepFunction::new(method, equation, dt, step))
}

pub(crate) fn diffusion_of(equation: &Equation) -> IntegratorResult<&Diffusion> {
    equation
        .diffusion()
        .ok_or_else(|| IntegratorError::InvalidDiffusionTerm {
            variable: equation.variable().to_string(),
            reason: "stochastic scheme requested for an equation without diffusion".to_string(),
        })
}

/// Wrap a step built for one calculus and relabel it, keeping the raw closure
pub(crate) fn with_step(
    method: &'static str,
    equation: &Equation,
    dt: f64,
    step: impl Fn(&State, f64, &[State], &mut dyn NoiseSource) -> StepOutput + Send + Sync + 'static,
) -> StepFunction {
    StepFunction::new(method, equation, dt, step_closure(step))
}
