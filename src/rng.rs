// src/rng.rs
//! Noise Sources for Stochastic Integration
//!
//! Every stochastic step draws one standard-normal sample per state element:
//! ```text
//! dW_i ~ N(0, 1),   ΔW_i = √Δt · dW_i
//! ```
//! The integrators never own or seed a generator. The caller passes a
//! [`NoiseSource`] into each step call, so reproducibility is controlled
//! entirely at this boundary:
//!
//! - [`GaussianNoise`] wraps any `rand::Rng` and samples `StandardNormal`
//! - [`FixedNoise`] replays a scripted sequence (deterministic tests)
//! - [`ZeroNoise`] always returns zeros
//! - [`RngFactory`] hands out one independent stream per trajectory

use crate::equation::State;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Source of standard-normal increments for stochastic schemes
pub trait NoiseSource {
    /// Draw `n` independent N(0,1) samples
    fn standard_normal(&mut self, n: usize) -> State;
}

/// Gaussian noise backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct GaussianNoise<R = StdRng> {
    rng: R,
}

impl GaussianNoise<StdRng> {
    /// Seeded `StdRng` stream
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: seed_rng_from_u64(seed),
        }
    }
}

impl<R: Rng> GaussianNoise<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> NoiseSource for GaussianNoise<R> {
    fn standard_normal(&mut self, n: usize) -> State {
        Array1::from_iter((0..n).map(|_| get_normal_draw(&mut self.rng)))
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted
#[derive(Debug, Clone)]
pub struct FixedNoise {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedNoise {
    /// An empty sequence behaves like [`ZeroNoise`].
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples handed out so far
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl NoiseSource for FixedNoise {
    fn standard_normal(&mut self, n: usize) -> State {
        if self.values.is_empty() {
            return Array1::zeros(n);
        }
        let start = self.cursor;
        self.cursor += n;
        Array1::from_shape_fn(n, |i| self.values[(start + i) % self.values.len()])
    }
}

/// Noise source that never perturbs the state
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn standard_normal(&mut self, n: usize) -> State {
        Array1::zeros(n)
    }
}

/// RNG factory for reproducible parallel ensembles
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Independent noise stream for a specific path
    pub fn noise_for_path(&self, path_id: u64) -> GaussianNoise<StdRng> {
        // splitmix64 finaliser so neighbouring path ids land far apart
        let mut z = self
            .base_seed
            .wrapping_add(path_id.wrapping_mul(0x9e3779b97f4a7c15));
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
        GaussianNoise::seeded(z ^ (z >> 31))
    }
}

pub fn seed_rng_from_u64(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}
