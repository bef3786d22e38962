//   Copyright 2024 The PyMC Developers
//
//   Licensed under the Apache License, Version 2.0 (the "License");
//   you may not use this file except in compliance with the License.
//   You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
//   Unless required by applicable law or agreed to in writing, software
//   distributed under the License is distributed on an "AS IS" BASIS,
//   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//   See the License for the specific language governing permissions and
//   limitations under the License.
#![warn(missing_docs)]

//! multilevel_decomp generates synthetic data for multilevel (hierarchical)
//! additive decomposition. Every observation is the sum of one contribution
//! per level, where each level has several mutually exclusive contributors
//! and exactly one of them is active per sample. Each contributor adds
//! Gaussian noise with its own mean and standard deviation.
//!
//! The crate builds coefficient tables (literal or sampled from
//! hyper-parameters), optionally aligns them so that every level's
//! contributor means average to zero, generates observations together with
//! the selected contributors, and one-hot encodes the selections for an
//! external regression or Bayesian fitter.

pub mod coefficients;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod math;
pub mod ops;

#[cfg(feature = "python")]
mod bindings;

pub use crate::coefficients::{BaselineMode, Coefficient, CoefficientTable, Level, TableSettings};
pub use crate::encoding::OneHotEncoder;
pub use crate::error::{DecompError, DecompResult};
pub use crate::generator::{GeneratorSettings, SampleGenerator, SampleSet};
