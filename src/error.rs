//! Error types returned by table construction, generation and encoding.

use thiserror::Error;

/// Failures raised while building a coefficient table or generating samples.
///
/// Errors are raised during setup; generation never returns partial output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecompError {
    /// A structural precondition was violated, e.g. an empty level or a
    /// baseline level with more than one contributor in strict mode.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A contributor was given a standard deviation of exactly zero.
    #[error("Degenerate distribution: contributor {contributor} of level {level} has zero standard deviation")]
    NumericDegeneracy {
        /// Level index of the offending contributor.
        level: usize,
        /// Contributor index within its level.
        contributor: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type DecompResult<T> = Result<T, DecompError>;
