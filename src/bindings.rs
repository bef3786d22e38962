//! Python entry points used from notebooks.

use std::str::FromStr;

use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::coefficients::{BaselineMode, CoefficientTable, TableSettings};
use crate::encoding::OneHotEncoder;
use crate::error::DecompError;
use crate::generator::{GeneratorSettings, SampleGenerator};
use crate::ops::Noise;

impl From<DecompError> for PyErr {
    fn from(err: DecompError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn parse_baseline(baseline: &str) -> PyResult<BaselineMode> {
    BaselineMode::from_str(baseline).map_err(PyValueError::new_err)
}

/// `TableWrapper` wraps around `CoefficientTable` so Python can hold on to a
/// table between generation calls.
#[pyclass]
struct TableWrapper {
    table: CoefficientTable,
}

#[pymethods]
impl TableWrapper {
    /// Nested `(mean, sigma)` pairs, one list per level.
    fn to_list(&self) -> Vec<Vec<(f64, f64)>> {
        self.table
            .levels()
            .map(|level| level.iter().map(|c| (c.mean(), c.sigma())).collect())
            .collect()
    }

    fn n_contributors(&self) -> Vec<usize> {
        self.table.n_contributors()
    }

    fn __repr__(&self) -> String {
        self.table.to_string()
    }
}

#[pyfunction]
fn table_from_levels(levels: Vec<Vec<(f64, f64)>>) -> PyResult<TableWrapper> {
    let table = CoefficientTable::from_levels(levels)?;
    Ok(TableWrapper { table })
}

#[pyfunction]
#[pyo3(signature = (n_contributors, contributor_avg, contributor_sig, baseline="strict", align=true, seed=None))]
fn build_table(
    n_contributors: Vec<usize>,
    contributor_avg: f64,
    contributor_sig: f64,
    baseline: &str,
    align: bool,
    seed: Option<u64>,
) -> PyResult<TableWrapper> {
    let settings = TableSettings::new(n_contributors, contributor_avg, contributor_sig)
        .with_baseline(parse_baseline(baseline)?)
        .with_align(align);
    let table = CoefficientTable::sample(&settings, &mut seeded_rng(seed))?;

    Ok(TableWrapper { table })
}

#[pyfunction]
fn align_table(wrapper: &TableWrapper) -> TableWrapper {
    TableWrapper {
        table: wrapper.table.aligned(),
    }
}

#[pyfunction]
#[pyo3(signature = (wrapper, n_samples, baseline="strict", noise="gaussian", drop_baseline=false, seed=None))]
fn generate<'py>(
    py: Python<'py>,
    wrapper: &TableWrapper,
    n_samples: usize,
    baseline: &str,
    noise: &str,
    drop_baseline: bool,
    seed: Option<u64>,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray2<usize>>)> {
    let settings = GeneratorSettings::new(n_samples)
        .with_baseline(parse_baseline(baseline)?)
        .with_noise(Noise::from_str(noise).map_err(PyValueError::new_err)?);
    let generator = SampleGenerator::new(settings);
    let samples = generator.generate(&wrapper.table, &mut seeded_rng(seed))?;

    let contributors = if drop_baseline {
        samples.without_baseline()
    } else {
        samples.contributors
    };

    Ok((
        samples.data.into_pyarray_bound(py),
        contributors.into_pyarray_bound(py),
    ))
}

#[pyfunction]
#[pyo3(signature = (contributors, n_contributors, include_baseline=true))]
fn one_hot<'py>(
    py: Python<'py>,
    contributors: PyReadonlyArray2<usize>,
    n_contributors: Vec<usize>,
    include_baseline: bool,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let encoder = OneHotEncoder::new(n_contributors, include_baseline);
    let encoded = encoder.encode(contributors.as_array())?;

    Ok(encoded.into_pyarray_bound(py))
}

#[pymodule]
fn multilevel_decomp(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<TableWrapper>()?;
    m.add_function(wrap_pyfunction!(table_from_levels, m)?)?;
    m.add_function(wrap_pyfunction!(build_table, m)?)?;
    m.add_function(wrap_pyfunction!(align_table, m)?)?;
    m.add_function(wrap_pyfunction!(generate, m)?)?;
    m.add_function(wrap_pyfunction!(one_hot, m)?)?;

    Ok(())
}
