// src/analytics/exact.rs
//! Closed-form references for the test equations
//!
//! # Linear ODE
//! ```text
//! dy/dt = A y          y(t) = y0 e^{A t}
//! ```
//!
//! # Ornstein–Uhlenbeck
//! ```text
//! dx = (μ - x)/τ dt + σ dW
//! E[x_t]   = μ + (x0 - μ) e^{-t/τ}
//! Var[x_t] = σ² τ / 2 · (1 - e^{-2t/τ})
//! ```
//!
//! # Brownian motion and GBM
//! ```text
//! dx = σ dW                  Var[x_t] = σ² t
//! dx = μ x dt + σ x dW       E[x_t] = x0 e^{μ t}              (Itô)
//! dx = μ x dt + σ x ∘ dW     E[x_t] = x0 e^{(μ + σ²/2) t}     (Stratonovich)
//! ```

/// Solution of `dy/dt = a·y` at time `t`
pub fn exponential_decay(y0: f64, a: f64, t: f64) -> f64 {
    y0 * (a * t).exp()
}

/// Solution of `tau dV/dt = -(V - v_inf)` at time `t`
pub fn relaxation(v0: f64, v_inf: f64, tau: f64, t: f64) -> f64 {
    v_inf + (v0 - v_inf) * (-t / tau).exp()
}

pub fn ou_mean(x0: f64, mean: f64, tau: f64, t: f64) -> f64 {
    relaxation(x0, mean, tau, t)
}

pub fn ou_variance(sigma: f64, tau: f64, t: f64) -> f64 {
    0.5 * sigma * sigma * tau * (1.0 - (-2.0 * t / tau).exp())
}

/// Stationary OU variance, the `t → ∞` limit of [`ou_variance`]
pub fn ou_stationary_variance(sigma: f64, tau: f64) -> f64 {
    0.5 * sigma * sigma * tau
}

pub fn brownian_variance(sigma: f64, t: f64) -> f64 {
    sigma * sigma * t
}

pub fn gbm_mean_ito(x0: f64, mu: f64, t: f64) -> f64 {
    x0 * (mu * t).exp()
}

pub fn gbm_mean_stratonovich(x0: f64, mu: f64, sigma: f64, t: f64) -> f64 {
    x0 * ((mu + 0.5 * sigma * sigma) * t).exp()
}
