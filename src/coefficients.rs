//! Coefficient tables describing the additive multilevel model.
//!
//! A table is an ordered sequence of levels. Each level holds the
//! `(mean, sigma)` pair of every contributor that may be active at that
//! level. This module provides:
//! - `CoefficientTable::from_levels`: validated construction from literal values.
//! - `CoefficientTable::sample`: random construction from hyper-parameters.
//! - `CoefficientTable::aligned`: shifts each level's means to average zero.
//! - Analytical moments of one observation under uniform selection.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use tracing::debug;

use crate::error::{DecompError, DecompResult};

/// Contract for the baseline level (level 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineMode {
    /// Level 0 must hold exactly one contributor.
    #[default]
    Strict,
    /// Every level is treated uniformly, including level 0.
    Relaxed,
}

impl FromStr for BaselineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(BaselineMode::Strict),
            "relaxed" => Ok(BaselineMode::Relaxed),
            _ => Err(format!("Unknown baseline mode: {}", s)),
        }
    }
}

impl BaselineMode {
    /// Checks the baseline contract against the number of contributors in
    /// level 0.
    pub(crate) fn check(&self, baseline_len: usize) -> DecompResult<()> {
        match self {
            BaselineMode::Strict if baseline_len != 1 => {
                Err(DecompError::InvalidConfiguration(format!(
                    "baseline level must have exactly one contributor, got {}",
                    baseline_len
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Gaussian parameters of a single contributor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient {
    mean: f64,
    sigma: f64,
}

impl Coefficient {
    /// Validates a `(mean, sigma)` pair for contributor `contributor` of
    /// level `level`.
    fn checked(level: usize, contributor: usize, mean: f64, sigma: f64) -> DecompResult<Self> {
        if !mean.is_finite() {
            return Err(DecompError::InvalidConfiguration(format!(
                "mean of contributor {} in level {} is not finite: {}",
                contributor, level, mean
            )));
        }
        if sigma == 0.0 {
            return Err(DecompError::NumericDegeneracy { level, contributor });
        }
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(DecompError::InvalidConfiguration(format!(
                "standard deviation of contributor {} in level {} must be positive and finite, got {}",
                contributor, level, sigma
            )));
        }

        Ok(Self { mean, sigma })
    }

    /// Mean of the contributor's Gaussian noise.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation of the contributor's Gaussian noise.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

/// Contributors of a single level, indexed by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    contributors: Vec<Coefficient>,
}

impl Level {
    /// Number of contributors in this level.
    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    /// Levels are never empty once constructed.
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// Parameters of contributor `idx`, if it exists.
    pub fn get(&self, idx: usize) -> Option<&Coefficient> {
        self.contributors.get(idx)
    }

    /// Iterates over the contributors in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Coefficient> {
        self.contributors.iter()
    }

    /// Arithmetic mean of the contributor means.
    ///
    /// Each mean is scaled before summing so the result stays finite for any
    /// finite means.
    pub fn mean_of_means(&self) -> f64 {
        let m = self.len() as f64;
        self.contributors.iter().map(|c| c.mean / m).sum()
    }
}

/// Rejects levels whose means are so far apart that shifting them by the
/// level average could leave the finite range.
fn check_spread(j: usize, level: &Level) -> DecompResult<()> {
    let (lo, hi) = level
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(c.mean), hi.max(c.mean))
        });
    if (hi - lo).is_finite() {
        Ok(())
    } else {
        Err(DecompError::InvalidConfiguration(format!(
            "contributor means of level {} span more than the finite range: [{}, {}]",
            j, lo, hi
        )))
    }
}

/// Immutable `(mean, sigma)` parameters for every contributor of every level.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    levels: Vec<Level>,
}

impl CoefficientTable {
    /// Creates a table from literal `(mean, sigma)` pairs, one inner vector
    /// per level.
    ///
    /// # Examples
    ///
    /// ```
    /// use multilevel_decomp::coefficients::CoefficientTable;
    ///
    /// let table = CoefficientTable::from_levels(vec![
    ///     vec![(0.0, 5.0)],
    ///     vec![(1.0, 1.0), (-1.0, 1.0)],
    /// ])
    /// .unwrap();
    /// assert_eq!(table.n_contributors(), vec![1, 2]);
    /// ```
    pub fn from_levels(levels: Vec<Vec<(f64, f64)>>) -> DecompResult<Self> {
        if levels.is_empty() {
            return Err(DecompError::InvalidConfiguration(
                "coefficient table must have at least one level".to_string(),
            ));
        }

        let levels = levels
            .into_iter()
            .enumerate()
            .map(|(j, pairs)| {
                if pairs.is_empty() {
                    return Err(DecompError::InvalidConfiguration(format!(
                        "level {} has no contributors",
                        j
                    )));
                }
                let contributors = pairs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (mean, sigma))| Coefficient::checked(j, i, mean, sigma))
                    .collect::<DecompResult<Vec<_>>>()?;
                let level = Level { contributors };
                check_spread(j, &level)?;
                Ok(level)
            })
            .collect::<DecompResult<Vec<_>>>()?;

        Ok(Self { levels })
    }

    /// Samples a table from the hyper-parameters in `settings`.
    ///
    /// Every contributor mean is drawn from `Normal(contributor_avg, 1)` and
    /// every standard deviation from `LogNormal(contributor_sig, 1)`. The
    /// table is aligned only when `settings.align` is set.
    pub fn sample<R: Rng + ?Sized>(settings: &TableSettings, rng: &mut R) -> DecompResult<Self> {
        settings.validate()?;

        let mean_dist = Normal::new(settings.contributor_avg, 1.0)
            .map_err(|e| DecompError::InvalidConfiguration(e.to_string()))?;
        let sigma_dist = LogNormal::new(settings.contributor_sig, 1.0)
            .map_err(|e| DecompError::InvalidConfiguration(e.to_string()))?;

        let levels: Vec<Vec<(f64, f64)>> = settings
            .n_contributors
            .iter()
            .map(|&m| {
                (0..m)
                    .map(|_| (mean_dist.sample(&mut *rng), sigma_dist.sample(&mut *rng)))
                    .collect()
            })
            .collect();
        let table = Self::from_levels(levels)?;

        debug!(
            n_contributors = ?settings.n_contributors,
            align = settings.align,
            "sampled coefficient table"
        );

        if settings.align {
            Ok(table.aligned())
        } else {
            Ok(table)
        }
    }

    /// Returns a copy whose contributor means average to zero in every level.
    ///
    /// Standard deviations are unchanged. Applying this twice is the same as
    /// applying it once.
    pub fn aligned(&self) -> Self {
        let levels = self
            .levels
            .iter()
            .map(|level| {
                let avg = level.mean_of_means();
                let contributors = level
                    .contributors
                    .iter()
                    .map(|c| Coefficient {
                        mean: c.mean - avg,
                        sigma: c.sigma,
                    })
                    .collect();
                Level { contributors }
            })
            .collect();

        Self { levels }
    }

    /// Whether every level's mean of means lies within `tol` of zero.
    pub fn is_aligned(&self, tol: f64) -> bool {
        self.levels.iter().all(|l| l.mean_of_means().abs() <= tol)
    }

    /// Number of levels.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Number of contributors in every level.
    pub fn n_contributors(&self) -> Vec<usize> {
        self.levels.iter().map(Level::len).collect()
    }

    /// Level `j`, if it exists.
    pub fn level(&self, j: usize) -> Option<&Level> {
        self.levels.get(j)
    }

    /// Iterates over the levels in order.
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    /// Expected value of one observation when contributors are selected
    /// uniformly within each level.
    pub fn expected_mean(&self) -> f64 {
        self.levels.iter().map(Level::mean_of_means).sum()
    }

    /// Variance of one observation when contributors are selected uniformly
    /// within each level.
    ///
    /// Each level contributes a Gaussian mixture with equal weights, whose
    /// variance is `mean(sigma^2 + mu^2) - mean(mu)^2`.
    pub fn expected_variance(&self) -> f64 {
        self.levels
            .iter()
            .map(|level| {
                let m = level.len() as f64;
                let second_moment = level
                    .iter()
                    .map(|c| c.sigma.powi(2) + c.mean.powi(2))
                    .sum::<f64>()
                    / m;
                second_moment - level.mean_of_means().powi(2)
            })
            .sum()
    }
}

impl fmt::Display for CoefficientTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (j, level) in self.levels.iter().enumerate() {
            write!(f, "level {}:", j)?;
            for (i, c) in level.iter().enumerate() {
                write!(f, " [{}] N({:.4}, {:.4})", i, c.mean, c.sigma)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Hyper-parameters used to sample a new `CoefficientTable`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    /// Number of contributors per level, `[m_0, ..., m_{L-1}]`.
    pub n_contributors: Vec<usize>,
    /// Center of the normal distribution contributor means are drawn from.
    pub contributor_avg: f64,
    /// Mean of the underlying normal of the log-normal distribution
    /// standard deviations are drawn from.
    pub contributor_sig: f64,
    /// Contract for level 0.
    pub baseline: BaselineMode,
    /// Whether the sampled table is aligned before it is returned.
    pub align: bool,
}

impl TableSettings {
    /// Creates strict, aligned settings for the given contributor counts.
    pub fn new(n_contributors: Vec<usize>, contributor_avg: f64, contributor_sig: f64) -> Self {
        Self {
            n_contributors,
            contributor_avg,
            contributor_sig,
            baseline: BaselineMode::Strict,
            align: true,
        }
    }

    /// Sets the baseline contract.
    pub fn with_baseline(mut self, baseline: BaselineMode) -> Self {
        self.baseline = baseline;
        self
    }

    /// Sets whether the sampled table is aligned.
    pub fn with_align(mut self, align: bool) -> Self {
        self.align = align;
        self
    }

    fn validate(&self) -> DecompResult<()> {
        let Some(&baseline_len) = self.n_contributors.first() else {
            return Err(DecompError::InvalidConfiguration(
                "at least one level is required".to_string(),
            ));
        };
        if let Some(j) = self.n_contributors.iter().position(|&m| m == 0) {
            return Err(DecompError::InvalidConfiguration(format!(
                "level {} has no contributors",
                j
            )));
        }
        if !self.contributor_avg.is_finite() || !self.contributor_sig.is_finite() {
            return Err(DecompError::InvalidConfiguration(format!(
                "hyper-parameters must be finite, got avg={} sig={}",
                self.contributor_avg, self.contributor_sig
            )));
        }
        self.baseline.check(baseline_len)
    }
}
