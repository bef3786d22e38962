//! Sampling operations used by the sample generator.
//!
//! This module provides:
//! - Noise strategies that produce a contributor's values for every sample
//! - Uniform selection of the active contributor within a level
//!
//! The module implements two noise strategies:
//! - Gaussian: Draws from `Normal(mean, sigma)` of the contributor
//! - MeanOnly: Returns the contributor mean without noise

use std::str::FromStr;

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::coefficients::Coefficient;

/// Source of the per-sample values a contributor adds to the observation.
pub trait NoiseSource {
    /// Returns `n_samples` values for `coefficient`, one per sample.
    fn draw<R: Rng + ?Sized>(
        &self,
        coefficient: &Coefficient,
        n_samples: usize,
        rng: &mut R,
    ) -> Array1<f64>;
}

/// Variants indicate the noise strategy used to produce contributor values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Noise {
    /// Gaussian implements the `GaussianNoise` strategy.
    Gaussian(GaussianNoise),
    /// MeanOnly implements the `MeanNoise` strategy.
    MeanOnly(MeanNoise),
}

impl Default for Noise {
    fn default() -> Self {
        Noise::Gaussian(GaussianNoise)
    }
}

impl FromStr for Noise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaussian" => Ok(Noise::Gaussian(GaussianNoise)),
            "mean" | "meanonly" => Ok(Noise::MeanOnly(MeanNoise)),
            _ => Err(format!("Unknown noise type: {}", s)),
        }
    }
}

impl NoiseSource for Noise {
    /// Calls the corresponding `draw` for each `Noise` variant
    fn draw<R: Rng + ?Sized>(
        &self,
        coefficient: &Coefficient,
        n_samples: usize,
        rng: &mut R,
    ) -> Array1<f64> {
        match self {
            Noise::Gaussian(gaussian) => gaussian.draw(coefficient, n_samples, rng),
            Noise::MeanOnly(mean) => mean.draw(coefficient, n_samples, rng),
        }
    }
}

/// Values are independent draws from the contributor's Gaussian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNoise;
impl NoiseSource for GaussianNoise {
    fn draw<R: Rng + ?Sized>(
        &self,
        coefficient: &Coefficient,
        n_samples: usize,
        rng: &mut R,
    ) -> Array1<f64> {
        let normal = Normal::new(coefficient.mean(), coefficient.sigma())
            .expect("contributor sigma is validated positive and finite");
        Array1::from_iter((0..n_samples).map(|_| normal.sample(&mut *rng)))
    }
}

/// Every value equals the contributor mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanNoise;
impl NoiseSource for MeanNoise {
    fn draw<R: Rng + ?Sized>(
        &self,
        coefficient: &Coefficient,
        n_samples: usize,
        _rng: &mut R,
    ) -> Array1<f64> {
        Array1::from_elem(n_samples, coefficient.mean())
    }
}

/// Sample the active contributor of a level with `n_contributors`
/// contributors, once per sample.
///
/// Every contributor is equally likely. A level with a single contributor
/// always selects index 0.
pub fn sample_selections<R: Rng + ?Sized>(
    n_contributors: usize,
    n_samples: usize,
    rng: &mut R,
) -> Vec<usize> {
    if n_contributors <= 1 {
        return vec![0; n_samples];
    }

    let uniform = Uniform::new(0, n_contributors);
    (0..n_samples).map(|_| uniform.sample(&mut *rng)).collect()
}
