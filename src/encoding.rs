//! One-hot encoding of contributor selections into a regression design matrix.

use ndarray::{Array2, ArrayView2};

use crate::error::{DecompError, DecompResult};

/// Encodes a contributor matrix into binary indicator columns, one block of
/// `m_j` columns per level.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    n_contributors: Vec<usize>,
    include_baseline: bool,
}

impl OneHotEncoder {
    /// Creates an encoder for levels with `n_contributors` contributors.
    ///
    /// When `include_baseline` is false the level 0 block is left out and
    /// the contributor matrix passed to `encode` must not contain the
    /// baseline column either.
    pub fn new(n_contributors: Vec<usize>, include_baseline: bool) -> Self {
        Self {
            n_contributors,
            include_baseline,
        }
    }

    /// Contributor counts of the levels that are encoded.
    fn encoded_levels(&self) -> &[usize] {
        if self.include_baseline {
            &self.n_contributors
        } else {
            self.n_contributors.get(1..).unwrap_or(&[])
        }
    }

    /// First level index that is encoded.
    fn first_level(&self) -> usize {
        usize::from(!self.include_baseline)
    }

    /// Total number of indicator columns.
    pub fn n_columns(&self) -> usize {
        self.encoded_levels().iter().sum()
    }

    /// Column labels of the form `level{j}_contributor{i}`.
    pub fn column_labels(&self) -> Vec<String> {
        let first = self.first_level();
        self.encoded_levels()
            .iter()
            .enumerate()
            .flat_map(|(offset, &m)| {
                (0..m).map(move |i| format!("level{}_contributor{}", first + offset, i))
            })
            .collect()
    }

    /// Encodes `contributors` into an `n_samples x n_columns` indicator matrix.
    pub fn encode(&self, contributors: ArrayView2<usize>) -> DecompResult<Array2<f64>> {
        let levels = self.encoded_levels();
        if contributors.ncols() != levels.len() {
            return Err(DecompError::InvalidConfiguration(format!(
                "expected {} contributor columns, got {}",
                levels.len(),
                contributors.ncols()
            )));
        }

        // Column offset of each level's block
        let offsets: Vec<usize> = levels
            .iter()
            .scan(0, |acc, &m| {
                let start = *acc;
                *acc += m;
                Some(start)
            })
            .collect();

        let mut encoded = Array2::<f64>::zeros((contributors.nrows(), self.n_columns()));
        for ((s, col), &i) in contributors.indexed_iter() {
            if i >= levels[col] {
                return Err(DecompError::InvalidConfiguration(format!(
                    "sample {} selects contributor {} of level {} which has {} contributors",
                    s,
                    i,
                    self.first_level() + col,
                    levels[col]
                )));
            }
            encoded[[s, offsets[col] + i]] = 1.0;
        }

        Ok(encoded)
    }
}
