//! Pluggable randomness for the update engine.
//!
//! All stochastic behaviour goes through [`RandomSource`] so tests can
//! substitute a fixed sequence of draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest value a source may yield; draws are always in `[0, 1)`.
const MAX_DRAW: f64 = 1.0 - f64::EPSILON;

pub trait RandomSource: Send {
    /// Next float in `[0, 1)`
    fn next_f64(&mut self) -> f64;

    /// Bernoulli draw with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform float in `[low, high)`
    fn range(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64).floor() as usize).min(len.saturating_sub(1))
    }
}

/// Seedable pseudo-random source backed by `StdRng`
pub struct StdRngSource {
    rng: StdRng,
}

impl StdRngSource {
    /// `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl RandomSource for StdRngSource {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    pos: usize,
}

impl SequenceSource {
    /// Values are clamped into `[0, 1)` and non-finite values become `0.0`.
    /// An empty list behaves like `constant(0.0)`.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, MAX_DRAW) } else { 0.0 })
            .collect();
        if values.is_empty() {
            values.push(0.0);
        }
        Self { values, pos: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }

    /// Number of draws taken so far
    pub fn draws(&self) -> usize {
        self.pos
    }
}

impl RandomSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        let value = self.values[self.pos % self.values.len()];
        self.pos += 1;
        value
    }
}
