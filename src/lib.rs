//! # neurint: Numerical Integrators for Neural Dynamics
//!
//! Turns the right-hand side of an ordinary or stochastic differential
//! equation into a one-step update function, for use inside neuron and
//! synapse simulations.
//!
//! ## Key Features
//!
//! - **Deterministic schemes**: Euler, midpoint, Heun, parametric RK2, RK3,
//!   RK4 and the RK4 3/8 rule
//! - **Stochastic schemes**: Euler–Maruyama, Stratonovich Heun and
//!   derivative-free Milstein in Itô and Stratonovich form
//! - **Exponential Euler**: exact on linear drifts, with the linear
//!   coefficient either supplied by the drift or extracted symbolically
//! - **Multi-valued drifts**: auxiliary outputs pass through every scheme
//! - **Merging**: several integrators combined into one update with
//!   isolated names
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use neurint::{get_integrator, Equation, IntegratorConfig};
//!
//! // dy/dt = -y
//! let equation = Equation::ode("y", |y, _t, _args| -y).expect("valid equation");
//! let step = get_integrator("RK4")
//!     .and_then(|rk4| rk4.build(&equation, &IntegratorConfig::with_dt(0.1)))
//!     .expect("rk4 supports ODEs");
//!
//! let y1 = step.call_ode(&array![1.0], 0.0, &[]).state;
//! assert!((y1[0] - (-0.1f64).exp()).abs() < 1e-6);
//! ```
//!
//! Stochastic equations take a noise source on every call:
//!
//! ```rust
//! use ndarray::array;
//! use neurint::rng::GaussianNoise;
//! use neurint::{get_integrator, Equation, IntegratorConfig};
//!
//! let ou = Equation::sde("x", |x, _t, _args| -x, 0.5).expect("valid equation");
//! let step = get_integrator("milstein")
//!     .and_then(|m| m.build(&ou, &IntegratorConfig::with_dt(0.01)))
//!     .expect("milstein supports SDEs");
//!
//! let mut noise = GaussianNoise::seeded(42);
//! let x1 = step.call(&array![0.0, 1.0], 0.0, &[], &mut noise).state;
//! assert_eq!(x1.len(), 2);
//! ```

// Module declarations
pub mod analytics;
pub mod compiler;
pub mod config;
pub mod equation;
pub mod error;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod output;
pub mod registry;
pub mod rng;
pub mod solvers;
pub mod symbolic;

// Re-export commonly used types for convenience
pub use compiler::{Built, IntegratorUnit, StateMap, StepCompiler, System};
pub use config::{CompileFlags, IntegratorConfig, MergeMode};
pub use equation::{Diffusion, Drift, Equation, EquationKind, Linearized, MultiReturn, State};
pub use error::{IntegratorError, IntegratorResult};
pub use registry::{get_integrator, Integrator};
pub use rng::NoiseSource;
pub use solvers::{SchemeParams, StepFunction, StepOutput};
