//! The staged filter-and-normalize run.
//!
//! Stage order is fixed: quality masking, row thresholding, column
//! thresholding, global degeneracy, optional class degeneracy, the
//! observation-count guard, the named transform, the post-transform sweeps,
//! and result assembly. Each stage takes ownership of the set from the
//! previous one and may shrink but never grow it; the transform preserves
//! shape exactly.

use crate::data::FeatureSet;
use crate::error::{NormalizeError, Result};
use crate::filter::{
    apply_threshold, drop_all_missing, drop_class_degenerate, drop_near_constant, Axis,
};
use crate::quality::{mask_special_values, profile_good_values};
use crate::transform::{self, DEFAULT_TRANSFORM};
use log::info;
use serde::{Deserialize, Serialize};

/// Minimum acceptable good-value proportion for each axis.
///
/// A value of 1 guarantees zero remaining invalid entries along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    /// Threshold applied to observations (rows).
    pub observations: f64,
    /// Threshold applied to features (columns).
    pub features: f64,
}

impl Default for ThresholdPair {
    /// Observations keep 70% good values; features must end up fully
    /// populated.
    fn default() -> Self {
        Self {
            observations: 0.70,
            features: 1.0,
        }
    }
}

/// Configuration for one normalization run.
///
/// All fields are defaulted; construct with `NormalizeConfig::default()` and
/// override what you need. Validation happens once, at pipeline entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Name of the transform to apply (default `mixedSigmoid`).
    pub transform: String,
    /// Good-value thresholds for both axes.
    pub thresholds: ThresholdPair,
    /// Whether to also drop features constant within any declared class.
    pub class_filter: bool,
    /// Whether to retain the filtered timing matrix in the output.
    pub keep_timings: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            transform: DEFAULT_TRANSFORM.to_string(),
            thresholds: ThresholdPair::default(),
            class_filter: false,
            keep_timings: false,
        }
    }
}

impl NormalizeConfig {
    /// Override the transform name.
    pub fn with_transform(mut self, name: &str) -> Self {
        self.transform = name.to_string();
        self
    }

    /// Override the threshold pair.
    pub fn with_thresholds(mut self, observations: f64, features: f64) -> Self {
        self.thresholds = ThresholdPair {
            observations,
            features,
        };
        self
    }

    /// Enable class-variance filtering.
    pub fn with_class_filter(mut self) -> Self {
        self.class_filter = true;
        self
    }

    /// Retain the filtered timing matrix in the output.
    pub fn with_timings(mut self) -> Self {
        self.keep_timings = true;
        self
    }

    /// Reject thresholds above 1. Values at or below 0 disable filtering on
    /// that axis, so only the upper bound is an error.
    pub fn validate(&self) -> Result<()> {
        if self.thresholds.observations > 1.0 {
            return Err(NormalizeError::InvalidThreshold {
                axis: Axis::Observations,
                value: self.thresholds.observations,
            });
        }
        if self.thresholds.features > 1.0 {
            return Err(NormalizeError::InvalidThreshold {
                axis: Axis::Features,
                value: self.thresholds.features,
            });
        }
        Ok(())
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(NormalizeError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(NormalizeError::from)
    }
}

/// Record of how the final matrix was produced. Created once, immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationInfo {
    /// Name of the transform applied.
    pub transform: String,
    /// Thresholds used for filtering.
    pub thresholds: ThresholdPair,
    /// Reproducibility description string.
    pub description: String,
}

impl NormalizationInfo {
    fn new(config: &NormalizeConfig) -> Self {
        let description = format!(
            "transform = {}, threshold pair = [{}, {}], class filter = {}",
            config.transform,
            config.thresholds.observations,
            config.thresholds.features,
            config.class_filter
        );
        Self {
            transform: config.transform.clone(),
            thresholds: config.thresholds,
            description,
        }
    }
}

/// Placeholder clustering record for one axis.
///
/// No clustering has been performed yet; downstream clustering code fills
/// this shape in later, so it is part of the output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPlaceholder {
    /// Distance metric used ("none" until clustering runs).
    pub distance_metric: String,
    /// Pairwise distances (empty until clustering runs).
    pub distances: Vec<f64>,
    /// Item ordering (identity until clustering runs).
    pub ordering: Vec<usize>,
    /// Linkage method used ("none" until clustering runs).
    pub linkage: String,
}

impl ClusterPlaceholder {
    /// Identity placeholder over `n` items.
    pub fn identity(n: usize) -> Self {
        Self {
            distance_metric: "none".to_string(),
            distances: Vec::new(),
            ordering: (0..n).collect(),
            linkage: "none".to_string(),
        }
    }
}

/// The assembled output of a normalization run.
#[derive(Debug, Clone)]
pub struct NormalizedSet {
    /// The final matrix with its quality codes, metadata, provenance, and
    /// (when requested) the filtered timing matrix.
    pub set: FeatureSet,
    /// How the matrix was produced.
    pub info: NormalizationInfo,
    /// Clustering placeholder for the observation axis.
    pub observation_clustering: ClusterPlaceholder,
    /// Clustering placeholder for the feature axis.
    pub feature_clustering: ClusterPlaceholder,
}

/// Run the full quality-aware filter-and-normalize pipeline.
pub fn normalize(set: FeatureSet, config: &NormalizeConfig) -> Result<NormalizedSet> {
    config.validate()?;

    // Stage 1: uniform missing marker and pre-filter profile.
    let mut set = set;
    let (masked, mask_outcome) = mask_special_values(set.data(), set.quality());
    set.replace_data(masked)?;
    info!("{}", mask_outcome);
    info!("{}", profile_good_values(set.data()));

    // Stage 2: rows first, so column proportions see the row-filtered matrix.
    let (set, _) = apply_threshold(&set, Axis::Observations, config.thresholds.observations)?;
    let (set, _) = apply_threshold(&set, Axis::Features, config.thresholds.features)?;

    // Stage 3: degenerate columns, globally and (optionally) per class.
    let (set, _) = drop_near_constant(&set)?;
    let set = if config.class_filter {
        drop_class_degenerate(&set)?.0
    } else {
        set
    };

    if set.n_observations() < 2 {
        return Err(NormalizeError::InsufficientObservations {
            remaining: set.n_observations(),
        });
    }

    // Stage 4: the named transform, shape-preserving by contract.
    let mut set = set;
    let normalized = transform::apply_named(set.data(), &config.transform)?;
    set.replace_data(normalized)?;

    // Stage 5: the transform can manufacture fresh degeneracies.
    let (set, _) = drop_all_missing(&set)?;
    let (set, _) = drop_near_constant(&set)?;

    let n_entries = set.n_observations() * set.n_features();
    let n_missing = set.data().iter().filter(|v| v.is_nan()).count();
    info!(
        "final matrix {}x{}: {} missing entries ({:.2}%)",
        set.n_observations(),
        set.n_features(),
        n_missing,
        100.0 * n_missing as f64 / n_entries as f64
    );

    // Stage 6: assemble.
    let mut set = set;
    if !config.keep_timings {
        set.clear_timings();
    }
    let observation_clustering = ClusterPlaceholder::identity(set.n_observations());
    let feature_clustering = ClusterPlaceholder::identity(set.n_features());

    Ok(NormalizedSet {
        info: NormalizationInfo::new(config),
        observation_clustering,
        feature_clustering,
        set,
    })
}
