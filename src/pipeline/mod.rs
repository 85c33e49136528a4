//! Pipeline composition and execution for feature-matrix normalization.

mod runner;

pub use runner::{
    normalize, ClusterPlaceholder, NormalizationInfo, NormalizeConfig, NormalizedSet,
    ThresholdPair,
};
