// src/equation.rs
//! Equation Descriptor
//!
//! An [`Equation`] wraps the right-hand side of
//! ```text
//! dy = f(y, t, args) dt                    (ODE)
//! dy = f(y, t, args) dt + g(y, t, args) dW (SDE)
//! ```
//! together with the name of the integrated variable. It is classified once,
//! at construction, into one of four [`EquationKind`]s. Every scheme builder
//! matches on that tag to pick its closure, so no call-time branching on the
//! shape of `f` is needed.
//!
//! # Drift shapes
//!
//! - [`Drift::Single`]: `f` returns the derivative only
//! - [`Drift::Multi`]: `f` returns the derivative plus auxiliary values that
//!   are handed back to the caller untouched
//! - [`Drift::Linearized`]: `f` also returns its linear coefficient `A`
//!   (`f(y) ≈ A·y + B`), the contract required by exponential Euler for SDEs

use crate::error::{validation::validate_identifier, IntegratorError, IntegratorResult};
use crate::symbolic::{self, Expr, Program, Scope};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

/// State of one integrated variable
pub type State = Array1<f64>;

/// `f(y, t, args) -> dy/dt`
pub type DriftFn = Arc<dyn Fn(&State, f64, &[State]) -> State + Send + Sync>;

/// `f(y, t, args) -> (dy/dt, aux...)`
pub type MultiDriftFn = Arc<dyn Fn(&State, f64, &[State]) -> MultiReturn + Send + Sync>;

/// `f(y, t, args) -> (dy/dt, A, aux...)`
pub type LinearizedFn = Arc<dyn Fn(&State, f64, &[State]) -> Linearized + Send + Sync>;

/// Element `i` of `a`, broadcasting length-1 arrays
#[inline]
pub(crate) fn element(a: &State, i: usize) -> f64 {
    if a.len() == 1 {
        a[0]
    } else {
        a[i]
    }
}

/// Derivative plus auxiliary outputs
#[derive(Debug, Clone, PartialEq)]
pub struct MultiReturn {
    pub derivative: State,
    pub aux: Vec<State>,
}

impl MultiReturn {
    pub fn new(derivative: State, aux: Vec<State>) -> Self {
        Self { derivative, aux }
    }
}

/// Derivative, its linear coefficient and auxiliary outputs
#[derive(Debug, Clone, PartialEq)]
pub struct Linearized {
    pub derivative: State,
    pub linear: State,
    pub aux: Vec<State>,
}

impl Linearized {
    pub fn new(derivative: State, linear: State) -> Self {
        Self {
            derivative,
            linear,
            aux: Vec::new(),
        }
    }

    pub fn with_aux(mut self, aux: Vec<State>) -> Self {
        self.aux = aux;
        self
    }
}

/// Deterministic part of the right-hand side
#[derive(Clone)]
pub enum Drift {
    Single(DriftFn),
    Multi(MultiDriftFn),
    Linearized(LinearizedFn),
}

impl Drift {
    /// Derivative only
    pub fn derivative(&self, y: &State, t: f64, args: &[State]) -> State {
        match self {
            Drift::Single(f) => f(y, t, args),
            Drift::Multi(f) => f(y, t, args).derivative,
            Drift::Linearized(f) => f(y, t, args).derivative,
        }
    }

    /// Derivative and auxiliary outputs
    pub fn evaluate(&self, y: &State, t: f64, args: &[State]) -> (State, Vec<State>) {
        match self {
            Drift::Single(f) => (f(y, t, args), Vec::new()),
            Drift::Multi(f) => {
                let out = f(y, t, args);
                (out.derivative, out.aux)
            }
            Drift::Linearized(f) => {
                let out = f(y, t, args);
                (out.derivative, out.aux)
            }
        }
    }

    pub fn is_linearized(&self) -> bool {
        matches!(self, Drift::Linearized(_))
    }
}

impl fmt::Debug for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drift::Single(_) => write!(f, "Drift::Single"),
            Drift::Multi(_) => write!(f, "Drift::Multi"),
            Drift::Linearized(_) => write!(f, "Drift::Linearized"),
        }
    }
}

/// Stochastic coefficient `g`
#[derive(Clone)]
pub enum Diffusion {
    Function(DriftFn),
    Scalar(f64),
    Array(State),
}

impl Diffusion {
    pub fn function<G>(g: G) -> Self
    where
        G: Fn(&State, f64, &[State]) -> State + Send + Sync + 'static,
    {
        Diffusion::Function(Arc::new(g))
    }

    /// Constant diffusion (additive noise)
    pub fn is_constant(&self) -> bool {
        !matches!(self, Diffusion::Function(_))
    }

    /// `g(y, t, args)`, broadcasting constants to the state length
    pub fn evaluate(&self, y: &State, t: f64, args: &[State]) -> State {
        match self {
            Diffusion::Function(g) => g(y, t, args),
            Diffusion::Scalar(v) => Array1::from_elem(y.len(), *v),
            Diffusion::Array(values) => {
                Array1::from_shape_fn(y.len(), |i| element(values, i))
            }
        }
    }

    fn validate(&self, variable: &str) -> IntegratorResult<()> {
        let invalid = |reason: String| IntegratorError::InvalidDiffusionTerm {
            variable: variable.to_string(),
            reason,
        };
        match self {
            Diffusion::Function(_) => Ok(()),
            Diffusion::Scalar(v) if !v.is_finite() => {
                Err(invalid(format!("constant must be finite, got {}", v)))
            }
            Diffusion::Scalar(_) => Ok(()),
            Diffusion::Array(values) if values.is_empty() => {
                Err(invalid("constant array is empty".to_string()))
            }
            Diffusion::Array(values) if values.iter().any(|v| !v.is_finite()) => {
                Err(invalid("constant array contains non-finite values".to_string()))
            }
            Diffusion::Array(_) => Ok(()),
        }
    }
}

impl From<f64> for Diffusion {
    fn from(value: f64) -> Self {
        Diffusion::Scalar(value)
    }
}

impl From<State> for Diffusion {
    fn from(values: State) -> Self {
        Diffusion::Array(values)
    }
}

impl fmt::Debug for Diffusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diffusion::Function(_) => write!(f, "Diffusion::Function"),
            Diffusion::Scalar(v) => write!(f, "Diffusion::Scalar({})", v),
            Diffusion::Array(values) => write!(f, "Diffusion::Array({})", values),
        }
    }
}

/// Structural classification resolved at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationKind {
    DeterministicSingle,
    DeterministicMulti,
    StochasticSingle,
    StochasticMulti,
}

impl EquationKind {
    pub fn classify(stochastic: bool, multi_valued: bool) -> Self {
        match (stochastic, multi_valued) {
            (false, false) => EquationKind::DeterministicSingle,
            (false, true) => EquationKind::DeterministicMulti,
            (true, false) => EquationKind::StochasticSingle,
            (true, true) => EquationKind::StochasticMulti,
        }
    }

    pub fn is_stochastic(&self) -> bool {
        matches!(
            self,
            EquationKind::StochasticSingle | EquationKind::StochasticMulti
        )
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            EquationKind::DeterministicMulti | EquationKind::StochasticMulti
        )
    }
}

/// Expression form of a drift, kept for linear-part extraction and renaming
#[derive(Debug, Clone)]
pub struct SymbolicDrift {
    pub source: String,
    /// Parsed tree with scope constants bound
    pub expr: Expr,
    /// Parsed tree before binding, used when names are isolated on merge
    pub unbound: Expr,
}

/// Equation descriptor consumed by the scheme builders
#[derive(Clone)]
pub struct Equation {
    variable: String,
    drift: Drift,
    diffusion: Option<Diffusion>,
    kind: EquationKind,
    args: Vec<String>,
    scope: Scope,
    symbolic: Option<SymbolicDrift>,
}

impl Equation {
    fn with_drift(variable: &str, drift: Drift, multi_valued: bool) -> IntegratorResult<Self> {
        validate_identifier("variable", variable)?;
        Ok(Self {
            variable: variable.to_string(),
            drift,
            diffusion: None,
            kind: EquationKind::classify(false, multi_valued),
            args: Vec::new(),
            scope: Scope::new(),
            symbolic: None,
        })
    }

    /// `dy/dt = f(y, t, args)`
    pub fn ode<F>(variable: &str, f: F) -> IntegratorResult<Self>
    where
        F: Fn(&State, f64, &[State]) -> State + Send + Sync + 'static,
    {
        Self::with_drift(variable, Drift::Single(Arc::new(f)), false)
    }

    /// `dy/dt = f(y, t, args)[0]`, auxiliary values passed through
    pub fn ode_multi<F>(variable: &str, f: F) -> IntegratorResult<Self>
    where
        F: Fn(&State, f64, &[State]) -> MultiReturn + Send + Sync + 'static,
    {
        Self::with_drift(variable, Drift::Multi(Arc::new(f)), true)
    }

    /// `dy = f dt + g dW`
    pub fn sde<F>(variable: &str, f: F, g: impl Into<Diffusion>) -> IntegratorResult<Self>
    where
        F: Fn(&State, f64, &[State]) -> State + Send + Sync + 'static,
    {
        Self::ode(variable, f)?.with_diffusion(g)
    }

    /// `dy = f[0] dt + g dW`, auxiliary values passed through
    pub fn sde_multi<F>(variable: &str, f: F, g: impl Into<Diffusion>) -> IntegratorResult<Self>
    where
        F: Fn(&State, f64, &[State]) -> MultiReturn + Send + Sync + 'static,
    {
        Self::ode_multi(variable, f)?.with_diffusion(g)
    }

    /// Drift that also reports its linear coefficient; auxiliary values are
    /// dropped
    pub fn linearized<F>(variable: &str, f: F) -> IntegratorResult<Self>
    where
        F: Fn(&State, f64, &[State]) -> Linearized + Send + Sync + 'static,
    {
        Self::with_drift(variable, Drift::Linearized(Arc::new(f)), false)
    }

    /// Drift that also reports its linear coefficient; auxiliary values are
    /// passed through
    pub fn linearized_multi<F>(variable: &str, f: F) -> IntegratorResult<Self>
    where
        F: Fn(&State, f64, &[State]) -> Linearized + Send + Sync + 'static,
    {
        Self::with_drift(variable, Drift::Linearized(Arc::new(f)), true)
    }

    /// Drift written as an expression in `variable`, `t`, the named `args` and
    /// the constants of `scope`
    pub fn from_expression(
        variable: &str,
        source: &str,
        args: &[&str],
        scope: Scope,
    ) -> IntegratorResult<Self> {
        validate_identifier("variable", variable)?;
        let args = Self::validate_args(variable, args)?;
        let unbound = symbolic::parse_bound(source, &Scope::new())?;
        let expr = unbound.bind(&scope);
        let program = symbolic::compile(&expr, variable, &args)?;

        let mut equation = Self::with_drift(variable, Self::program_drift(program), false)?;
        equation.args = args;
        equation.scope = scope;
        equation.symbolic = Some(SymbolicDrift {
            source: source.to_string(),
            expr,
            unbound,
        });
        Ok(equation)
    }

    fn program_drift(program: Program) -> Drift {
        Drift::Single(Arc::new(move |y: &State, t: f64, args: &[State]| {
            symbolic::evaluate(&program, y, t, args)
        }))
    }

    fn validate_args(variable: &str, args: &[&str]) -> IntegratorResult<Vec<String>> {
        let mut names: Vec<String> = Vec::with_capacity(args.len());
        for arg in args {
            validate_identifier("args", arg)?;
            let reason = if *arg == variable || *arg == symbolic::TIME_SYMBOL {
                Some(format!("argument '{}' shadows the variable or time", arg))
            } else if names.iter().any(|n| n == arg) {
                Some(format!("argument '{}' is declared twice", arg))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(IntegratorError::InvalidEquation {
                    field: "args".to_string(),
                    reason,
                });
            }
            names.push(arg.to_string());
        }
        Ok(names)
    }

    /// Attach a diffusion term, turning the equation stochastic
    pub fn with_diffusion(mut self, g: impl Into<Diffusion>) -> IntegratorResult<Self> {
        let g = g.into();
        g.validate(&self.variable)?;
        self.diffusion = Some(g);
        self.kind = EquationKind::classify(true, self.kind.is_multi_valued());
        Ok(self)
    }

    /// Attach a diffusion written as an expression over the same symbols as
    /// the drift. An expression free of the variable, `t` and the arguments
    /// becomes a constant (additive noise).
    pub fn with_diffusion_expression(self, source: &str) -> IntegratorResult<Self> {
        let invalid = |reason: String| IntegratorError::InvalidDiffusionTerm {
            variable: self.variable.clone(),
            reason,
        };
        let expr = symbolic::parse(source)
            .map_err(|e| invalid(format!("'{}': {}", source, e)))?
            .bind(&self.scope)
            .fold();
        let program = symbolic::compile(&expr, &self.variable, &self.args)
            .map_err(|e| invalid(e.to_string()))?;

        let g = match program.constant() {
            Some(value) => Diffusion::Scalar(value),
            None => Diffusion::function(move |y: &State, t: f64, args: &[State]| {
                symbolic::evaluate(&program, y, t, args)
            }),
        };
        self.with_diffusion(g)
    }

    /// Declare the names of the positional arguments
    pub fn with_args(mut self, args: &[&str]) -> IntegratorResult<Self> {
        if self.symbolic.is_some() {
            return Err(IntegratorError::InvalidEquation {
                field: "args".to_string(),
                reason: "arguments of an expression are fixed when it is parsed".to_string(),
            });
        }
        self.args = Self::validate_args(&self.variable, args)?;
        Ok(self)
    }

    /// Same equation with constant sub-expressions of a symbolic drift folded
    pub fn folded(&self) -> IntegratorResult<Self> {
        let Some(symbolic) = &self.symbolic else {
            return Ok(self.clone());
        };
        let expr = symbolic.expr.fold();
        let program = symbolic::compile(&expr, &self.variable, &self.args)?;
        let mut equation = self.clone();
        equation.drift = Self::program_drift(program);
        equation.symbolic = Some(SymbolicDrift {
            expr,
            ..symbolic.clone()
        });
        Ok(equation)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn drift(&self) -> &Drift {
        &self.drift
    }

    pub fn diffusion(&self) -> Option<&Diffusion> {
        self.diffusion.as_ref()
    }

    pub fn kind(&self) -> EquationKind {
        self.kind
    }

    pub fn is_stochastic(&self) -> bool {
        self.kind.is_stochastic()
    }

    pub fn is_multi_valued(&self) -> bool {
        self.kind.is_multi_valued()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn symbolic(&self) -> Option<&SymbolicDrift> {
        self.symbolic.as_ref()
    }
}

impl fmt::Debug for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equation")
            .field("variable", &self.variable)
            .field("kind", &self.kind)
            .field("drift", &self.drift)
            .field("diffusion", &self.diffusion)
            .field("args", &self.args)
            .field("symbolic", &self.symbolic.as_ref().map(|s| &s.source))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification() {
        let ode = Equation::ode("x", |y, _, _| -y).unwrap();
        assert_eq!(ode.kind(), EquationKind::DeterministicSingle);

        let multi = Equation::ode_multi("x", |y, _, _| MultiReturn::new(-y, vec![y.clone()])).unwrap();
        assert_eq!(multi.kind(), EquationKind::DeterministicMulti);

        let sde = Equation::sde("x", |y, _, _| -y, 0.5).unwrap();
        assert_eq!(sde.kind(), EquationKind::StochasticSingle);
        assert!(sde.diffusion().unwrap().is_constant());

        let sde_multi = multi.with_diffusion(Diffusion::function(|y, _, _| y * 0.1)).unwrap();
        assert_eq!(sde_multi.kind(), EquationKind::StochasticMulti);
        assert!(!sde_multi.drift().is_linearized());

        let linear = Equation::linearized("x", |y, _, _| Linearized::new(-y, array![-1.0])).unwrap();
        assert!(linear.drift().is_linearized());
        assert_eq!(linear.kind(), EquationKind::DeterministicSingle);
    }

    #[test]
    fn test_empty_variable_rejected() {
        let err = Equation::ode("", |y, _, _| y.clone()).unwrap_err();
        assert!(matches!(err, IntegratorError::InvalidEquation { .. }));
    }

    #[test]
    fn test_invalid_diffusion_constants() {
        let nan = Equation::sde("x", |y, _, _| -y, f64::NAN).unwrap_err();
        assert!(matches!(nan, IntegratorError::InvalidDiffusionTerm { .. }));

        let empty = Equation::sde("x", |y, _, _| -y, State::zeros(0)).unwrap_err();
        assert!(matches!(empty, IntegratorError::InvalidDiffusionTerm { .. }));

        let inf = Equation::sde("x", |y, _, _| -y, array![1.0, f64::INFINITY]).unwrap_err();
        assert!(matches!(inf, IntegratorError::InvalidDiffusionTerm { .. }));
    }

    #[test]
    fn test_diffusion_broadcast() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(Diffusion::Scalar(2.0).evaluate(&y, 0.0, &[]), array![2.0, 2.0, 2.0]);
        assert_eq!(
            Diffusion::Array(array![0.5]).evaluate(&y, 0.0, &[]),
            array![0.5, 0.5, 0.5]
        );
    }

    #[test]
    fn test_expression_equation() {
        let scope: Scope = [("tau".to_string(), 10.0), ("V_rest".to_string(), -65.0)]
            .into_iter()
            .collect();
        let eq = Equation::from_expression("V", "(-(V - V_rest) + I)/tau", &["I"], scope).unwrap();

        let dv = eq.drift().derivative(&array![-65.0, -55.0], 0.0, &[array![10.0]]);
        assert_eq!(dv, array![1.0, 0.0]);
        assert_eq!(eq.args(), &["I".to_string()]);
    }

    #[test]
    fn test_expression_with_unknown_symbol() {
        let err = Equation::from_expression("V", "-V/tau", &[], Scope::new()).unwrap_err();
        assert!(matches!(err, IntegratorError::SymbolicError { .. }));
    }

    #[test]
    fn test_diffusion_expression() {
        let scope: Scope = [("sigma".to_string(), 0.3)].into_iter().collect();
        let additive = Equation::from_expression("x", "-x", &[], scope.clone())
            .unwrap()
            .with_diffusion_expression("sigma*2")
            .unwrap();
        assert!(matches!(additive.diffusion(), Some(Diffusion::Scalar(v)) if (*v - 0.6).abs() < 1e-15));

        let multiplicative = Equation::from_expression("x", "-x", &[], scope.clone())
            .unwrap()
            .with_diffusion_expression("sigma*x")
            .unwrap();
        assert!(!multiplicative.diffusion().unwrap().is_constant());

        let err = Equation::from_expression("x", "-x", &[], scope)
            .unwrap()
            .with_diffusion_expression("sigma*w")
            .unwrap_err();
        assert!(matches!(err, IntegratorError::InvalidDiffusionTerm { .. }));
    }

    #[test]
    fn test_duplicate_args_rejected() {
        let err = Equation::ode("x", |y, _, _| -y)
            .unwrap()
            .with_args(&["I", "I"])
            .unwrap_err();
        assert!(matches!(err, IntegratorError::InvalidEquation { .. }));
    }

    #[test]
    fn test_folded_matches_unfolded() {
        let scope: Scope = [("a".to_string(), 3.0), ("b".to_string(), 7.0)]
            .into_iter()
            .collect();
        let eq = Equation::from_expression("x", "-(a/b)*x + a*b", &[], scope).unwrap();
        let folded = eq.folded().unwrap();

        let y = array![0.3, -1.7];
        assert_eq!(
            eq.drift().derivative(&y, 0.0, &[]),
            folded.drift().derivative(&y, 0.0, &[])
        );
        assert_eq!(folded.symbolic().unwrap().expr.to_string(), "-0.42857142857142855*x + 21");
    }
}
