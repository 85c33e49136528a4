//! Named normalization transforms and their dispatcher.
//!
//! The pipeline treats normalization as a pluggable named function with a
//! fixed numeric contract: input matrix in, output matrix of identical shape
//! out, new NaNs allowed. The reserved names `nothing` and `none` are
//! identities handled here and never reach the registry.

mod sigmoid;

pub use sigmoid::{norm_mixed_sigmoid, norm_scaled_robust_sigmoid, norm_sigmoid, norm_zscore};

use crate::error::{NormalizeError, Result};
use log::info;
use nalgebra::DMatrix;

/// The default transform applied when the caller does not choose one.
pub const DEFAULT_TRANSFORM: &str = "mixedSigmoid";

/// Names of the transforms the registry can resolve, plus the identities.
pub const TRANSFORM_NAMES: &[&str] = &[
    "mixedSigmoid",
    "scaledRobustSigmoid",
    "sigmoid",
    "zscore",
    "nothing",
    "none",
];

/// Apply the transform registered under `name` to the matrix.
///
/// `nothing`/`none` return the input unchanged (with a diagnostic that no
/// transform was applied). Any other name is resolved in the registry; the
/// returned matrix is authoritative, including freshly-introduced NaNs.
pub fn apply_named(data: &DMatrix<f64>, name: &str) -> Result<DMatrix<f64>> {
    match name {
        "nothing" | "none" => {
            info!("transform '{}': no normalization applied", name);
            Ok(data.clone())
        }
        "zscore" => Ok(norm_zscore(data)),
        "sigmoid" => Ok(norm_sigmoid(data)),
        "scaledRobustSigmoid" => Ok(norm_scaled_robust_sigmoid(data)),
        "mixedSigmoid" => Ok(norm_mixed_sigmoid(data)),
        other => Err(NormalizeError::UnknownTransform(other.to_string())),
    }
}
