//! Error types for the tsnorm library.

use crate::filter::Axis;
use thiserror::Error;

/// Main error type for the library.
///
/// Every pipeline error is fatal: the run aborts and no partial matrix is
/// ever handed to the caller.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {axis} threshold {value}: thresholds must not exceed 1")]
    InvalidThreshold { axis: Axis, value: f64 },

    #[error("No {axis} satisfy the good-value threshold of {threshold}")]
    ThresholdTooStrict { axis: Axis, threshold: f64 },

    #[error("Every surviving feature is near-constant across observations")]
    AllFeaturesDegenerate,

    #[error("Every surviving feature is near-constant within some class")]
    AllFeaturesClassDegenerate,

    #[error("Only {remaining} observation(s) remain; normalization requires at least 2")]
    InsufficientObservations { remaining: usize },

    #[error("Normalization left every feature column entirely missing")]
    AllColumnsBadAfterNormalization,

    #[error("Unknown normalization transform '{0}'")]
    UnknownTransform(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Empty data: {0}")]
    EmptyData(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, NormalizeError>;
