//! Quality-aware filtering and normalization for time-series feature matrices.
//!
//! An upstream feature-extraction stage produces a matrix with one row per
//! observed time series and one column per computed feature, alongside a
//! parallel matrix of quality codes marking entries whose computation failed.
//! This library trims that matrix down to its trustworthy part and squashes
//! the surviving values onto comparable scales, ready for downstream
//! clustering or classification.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (FeatureSet, descriptor tables, provenance)
//! - **quality**: Quality-code masking and good-value profiling
//! - **filter**: Threshold and degeneracy filtering
//! - **transform**: Named column-wise squashing transforms
//! - **pipeline**: The staged run and its configuration
//!
//! # Example
//!
//! ```no_run
//! use tsnorm::prelude::*;
//!
//! let set = FeatureSet::from_tsv_parts("features.tsv", Some("quality.tsv"), None).unwrap();
//!
//! let config = NormalizeConfig::default()
//!     .with_transform("mixedSigmoid")
//!     .with_thresholds(0.70, 1.0);
//!
//! let result = normalize(set, &config).unwrap();
//! println!("{}", result.info.description);
//! ```

pub mod data;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod quality;
pub mod stats;
pub mod transform;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{FeatureSet, OperationInfo, Provenance, TimeSeriesInfo};
    pub use crate::error::{NormalizeError, Result};
    pub use crate::filter::{
        apply_threshold, drop_all_missing, drop_class_degenerate, drop_near_constant,
        threshold_keep_mask, Axis, DegeneracyOutcome, ThresholdOutcome, NEAR_CONSTANT_TOL,
    };
    pub use crate::pipeline::{
        normalize, ClusterPlaceholder, NormalizationInfo, NormalizeConfig, NormalizedSet,
        ThresholdPair,
    };
    pub use crate::quality::{
        mask_special_values, profile_good_values, GoodValueProfile, MaskOutcome,
    };
    pub use crate::transform::{
        apply_named, norm_mixed_sigmoid, norm_scaled_robust_sigmoid, norm_sigmoid, norm_zscore,
        DEFAULT_TRANSFORM, TRANSFORM_NAMES,
    };
}
