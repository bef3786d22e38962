//! Synthetic data generation for the additive multilevel model.
//!
//! For every sample one contributor is selected uniformly at random in each
//! level, and the observation is the sum over levels of the value drawn for
//! the selected contributor.

use ndarray::{s, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::coefficients::{BaselineMode, CoefficientTable};
use crate::error::DecompResult;
use crate::math::RunningStd;
use crate::ops::{sample_selections, Noise, NoiseSource};

/// GeneratorSettings are parameters used to initialize a new `SampleGenerator`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    /// Number of observations per generation call.
    pub n_samples: usize,
    /// Contract enforced on the baseline level of the table.
    pub baseline: BaselineMode,
    /// Strategy producing contributor values.
    pub noise: Noise,
}

impl GeneratorSettings {
    /// Creates strict settings with Gaussian noise.
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            baseline: BaselineMode::Strict,
            noise: Noise::default(),
        }
    }

    /// Sets the baseline contract.
    pub fn with_baseline(mut self, baseline: BaselineMode) -> Self {
        self.baseline = baseline;
        self
    }

    /// Sets the noise strategy.
    pub fn with_noise(mut self, noise: Noise) -> Self {
        self.noise = noise;
        self
    }
}

/// Observations and the contributor selected at every level for each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    /// Observed value of every sample.
    pub data: Array1<f64>,
    /// `contributors[[s, j]]` is the contributor selected at level `j` for
    /// sample `s`.
    pub contributors: Array2<usize>,
}

impl SampleSet {
    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.data.len()
    }

    /// Number of levels (columns of the contributor matrix).
    pub fn n_levels(&self) -> usize {
        self.contributors.ncols()
    }

    /// Contributor matrix without the baseline column.
    ///
    /// In strict mode the baseline column is constant and carries no
    /// information for a fit.
    pub fn without_baseline(&self) -> Array2<usize> {
        self.contributors.slice(s![.., 1..]).to_owned()
    }

    /// Running mean, standard deviation and standard error of `data`.
    pub fn summary(&self) -> RunningStd {
        self.data.iter().copied().collect()
    }

    /// Number of times each contributor of level `j` was selected.
    ///
    /// The result holds at least `n_contributors` entries so contributors
    /// that were never selected still show up with a zero count. It grows to
    /// cover any larger selection found in the column, so every sample is
    /// counted. Returns `None` if `j` is not a level of this sample set.
    pub fn selection_counts(&self, j: usize, n_contributors: usize) -> Option<Vec<usize>> {
        if j >= self.n_levels() {
            return None;
        }

        let column = self.contributors.column(j);
        let width = column
            .iter()
            .map(|&i| i + 1)
            .fold(n_contributors, usize::max);
        let mut counts = vec![0; width];
        for &i in column.iter() {
            counts[i] += 1;
        }
        Some(counts)
    }
}

/// SampleGenerator draws `SampleSet`s from a `CoefficientTable`.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    /// Parameters to initialize `SampleGenerator`.
    pub settings: GeneratorSettings,
}

impl SampleGenerator {
    /// Creates a `SampleGenerator` with the given `GeneratorSettings`.
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    /// Generates a `SampleSet` using the configured noise strategy.
    ///
    /// # Examples
    ///
    /// ```
    /// use multilevel_decomp::coefficients::CoefficientTable;
    /// use multilevel_decomp::generator::{GeneratorSettings, SampleGenerator};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let table = CoefficientTable::from_levels(vec![
    ///     vec![(0.0, 5.0)],
    ///     vec![(1.0, 1.0), (-1.0, 1.0)],
    /// ])
    /// .unwrap();
    /// let generator = SampleGenerator::new(GeneratorSettings::new(100));
    /// let samples = generator.generate(&table, &mut StdRng::seed_from_u64(7)).unwrap();
    /// assert_eq!(samples.contributors.dim(), (100, 2));
    /// ```
    pub fn generate<R: Rng + ?Sized>(
        &self,
        table: &CoefficientTable,
        rng: &mut R,
    ) -> DecompResult<SampleSet> {
        let noise = self.settings.noise;
        self.generate_with(table, &noise, rng)
    }

    /// Generates a `SampleSet` drawing contributor values from `noise`.
    ///
    /// The baseline contract is checked before anything is drawn.
    pub fn generate_with<N, R>(
        &self,
        table: &CoefficientTable,
        noise: &N,
        rng: &mut R,
    ) -> DecompResult<SampleSet>
    where
        N: NoiseSource,
        R: Rng + ?Sized,
    {
        let n_contributors = table.n_contributors();
        // Tables always hold at least one level
        self.settings.baseline.check(n_contributors[0])?;

        let n_samples = self.settings.n_samples;
        let mut data = Array1::<f64>::zeros(n_samples);
        let mut contributors = Array2::<usize>::zeros((n_samples, table.n_levels()));

        for (j, level) in table.levels().enumerate() {
            let values: Vec<Array1<f64>> = level
                .iter()
                .map(|coefficient| noise.draw(coefficient, n_samples, &mut *rng))
                .collect();
            let selections = sample_selections(level.len(), n_samples, &mut *rng);

            for (s, &i) in selections.iter().enumerate() {
                data[s] += values[i][s];
                contributors[[s, j]] = i;
            }
        }

        debug!(
            n_samples,
            n_levels = table.n_levels(),
            "generated sample set"
        );

        Ok(SampleSet { data, contributors })
    }

    /// Generates `n_runs` independent `SampleSet`s.
    ///
    /// Every run draws from its own stream seeded from a master generator
    /// built with `seed`, so runs are reproducible and independent of one
    /// another.
    pub fn generate_runs(
        &self,
        table: &CoefficientTable,
        n_runs: usize,
        seed: u64,
    ) -> DecompResult<Vec<SampleSet>> {
        let mut master = StdRng::seed_from_u64(seed);
        let runs = (0..n_runs)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(master.gen());
                self.generate(table, &mut rng)
            })
            .collect::<DecompResult<Vec<_>>>()?;

        info!(n_runs, seed, "generated experiment runs");

        Ok(runs)
    }
}
