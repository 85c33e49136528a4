//! Data structures for feature-matrix normalization.

mod feature_set;
mod metadata;

pub use feature_set::{FeatureSet, Provenance};
pub use metadata::{OperationInfo, TimeSeriesInfo};
