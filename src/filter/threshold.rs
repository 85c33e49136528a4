//! Good-value-proportion threshold filtering.
//!
//! One parameterized algorithm serves both axes: the keep-mask is computed
//! along the requested axis and applied to every parallel structure at once.
//! Row filtering must run (and be applied) before column filtering so that
//! column proportions are computed on the row-filtered matrix; the pipeline
//! runner enforces that ordering.

use crate::data::FeatureSet;
use crate::error::{NormalizeError, Result};
use crate::stats::good_fraction;
use log::info;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which axis a filtering pass operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Rows: one observed time series each.
    Observations,
    /// Columns: one computed feature each.
    Features,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Observations => write!(f, "observations"),
            Axis::Features => write!(f, "features"),
        }
    }
}

/// Result of one threshold-filtering pass, for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdOutcome {
    /// Axis the pass ran on.
    pub axis: Axis,
    /// Threshold applied.
    pub threshold: f64,
    /// Items before filtering.
    pub n_before: usize,
    /// Items after filtering.
    pub n_after: usize,
    /// Names of removed items.
    pub removed: Vec<String>,
    /// Whether every item survived.
    pub kept_all: bool,
}

impl std::fmt::Display for ThresholdOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kept_all {
            write!(
                f,
                "kept all {} {} at threshold {}",
                self.n_before, self.axis, self.threshold
            )
        } else {
            write!(
                f,
                "removed {} of {} {} at threshold {}",
                self.removed.len(),
                self.n_before,
                self.axis,
                self.threshold
            )
        }
    }
}

/// Compute the keep-mask for one axis at the given threshold.
///
/// The mask length always equals the size of the requested axis, including
/// on the disabled path: a threshold of zero (or below) keeps everything
/// without inspecting the matrix. Otherwise an item is kept iff its
/// proportion of good (non-missing) values is at least the threshold. An
/// empty keep-set is fatal.
pub fn threshold_keep_mask(data: &DMatrix<f64>, axis: Axis, threshold: f64) -> Result<Vec<bool>> {
    let n = match axis {
        Axis::Observations => data.nrows(),
        Axis::Features => data.ncols(),
    };

    if threshold <= 0.0 {
        return Ok(vec![true; n]);
    }

    let keep: Vec<bool> = (0..n)
        .into_par_iter()
        .map(|idx| {
            let values: Vec<f64> = match axis {
                Axis::Observations => data.row(idx).iter().copied().collect(),
                Axis::Features => data.column(idx).iter().copied().collect(),
            };
            good_fraction(&values) >= threshold
        })
        .collect();

    if !keep.iter().any(|&k| k) {
        return Err(NormalizeError::ThresholdTooStrict { axis, threshold });
    }

    Ok(keep)
}

/// Filter one axis of a feature set by good-value proportion.
///
/// Applies the keep-mask to the feature matrix, the quality codes, the
/// timings, and the metadata table for that axis, returning the smaller owned
/// set and a diagnostic outcome.
pub fn apply_threshold(
    set: &FeatureSet,
    axis: Axis,
    threshold: f64,
) -> Result<(FeatureSet, ThresholdOutcome)> {
    let keep = threshold_keep_mask(set.data(), axis, threshold)?;
    let keep_indices: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter(|(_, &k)| k)
        .map(|(i, _)| i)
        .collect();

    let n_before = keep.len();
    let n_after = keep_indices.len();
    let kept_all = n_after == n_before;

    let removed: Vec<String> = keep
        .iter()
        .enumerate()
        .filter(|(_, &k)| !k)
        .map(|(i, _)| match axis {
            Axis::Observations => set.time_series()[i].name.clone(),
            Axis::Features => set.operations()[i].name.clone(),
        })
        .collect();

    let filtered = if kept_all {
        set.clone()
    } else {
        match axis {
            Axis::Observations => set.subset_rows(&keep_indices)?,
            Axis::Features => set.subset_columns(&keep_indices)?,
        }
    };

    let outcome = ThresholdOutcome {
        axis,
        threshold,
        n_before,
        n_after,
        removed,
        kept_all,
    };
    info!("{}", outcome);

    Ok((filtered, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{OperationInfo, TimeSeriesInfo};

    fn make_set(data: DMatrix<f64>) -> FeatureSet {
        let time_series = (0..data.nrows())
            .map(|i| TimeSeriesInfo::new(format!("ts_{}", i)))
            .collect();
        let operations = (0..data.ncols())
            .map(|j| OperationInfo::new(format!("op_{}", j), j))
            .collect();
        FeatureSet::without_quality(data, time_series, operations).unwrap()
    }

    #[test]
    fn test_zero_threshold_mask_has_axis_length() {
        // Regression for the upstream square-matrix bug: the mask length must
        // equal the axis size for a non-square matrix on both axes.
        let data = DMatrix::from_element(3, 7, f64::NAN);
        let rows = threshold_keep_mask(&data, Axis::Observations, 0.0).unwrap();
        let cols = threshold_keep_mask(&data, Axis::Features, 0.0).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(cols.len(), 7);
        assert!(rows.iter().all(|&k| k));
        assert!(cols.iter().all(|&k| k));
    }

    #[test]
    fn test_row_with_mostly_missing_removed() {
        // 10 × 5 with one row 80% missing; threshold 0.70 removes only it.
        let mut data = DMatrix::from_element(10, 5, 1.0);
        for j in 0..5 {
            data[(4, j)] = f64::NAN;
        }
        data[(4, 0)] = 1.0; // 20% good, below 0.70

        let set = make_set(data);
        let (filtered, outcome) = apply_threshold(&set, Axis::Observations, 0.70).unwrap();

        assert_eq!(filtered.n_observations(), 9);
        assert_eq!(outcome.removed, vec!["ts_4"]);
        assert!(!outcome.kept_all);
    }

    #[test]
    fn test_surviving_items_meet_threshold() {
        let data = DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 2.0, 3.0, //
                f64::NAN, 2.0, 3.0, //
                f64::NAN, f64::NAN, 3.0, //
                f64::NAN, f64::NAN, f64::NAN,
            ],
        );
        let set = make_set(data);
        let (filtered, _) = apply_threshold(&set, Axis::Observations, 0.6).unwrap();

        for i in 0..filtered.n_observations() {
            assert!(good_fraction(&filtered.row(i)) >= 0.6);
        }
        assert_eq!(filtered.n_observations(), 2);
    }

    #[test]
    fn test_threshold_one_removes_any_missing() {
        let data = DMatrix::from_row_slice(3, 2, &[1.0, f64::NAN, 2.0, 5.0, 3.0, 6.0]);
        let set = make_set(data);
        let (filtered, _) = apply_threshold(&set, Axis::Features, 1.0).unwrap();

        // Column 1 has a missing entry in row 0, so only column 0 survives.
        assert_eq!(filtered.n_features(), 1);
        assert_eq!(filtered.operations()[0].name, "op_0");
        for j in 0..filtered.n_features() {
            assert!(filtered.column(j).iter().all(|v| !v.is_nan()));
        }
    }

    #[test]
    fn test_kept_all_on_clean_matrix() {
        let data = DMatrix::from_element(4, 4, 2.0);
        let set = make_set(data);
        let (filtered, outcome) = apply_threshold(&set, Axis::Features, 1.0).unwrap();

        assert!(outcome.kept_all);
        assert!(outcome.removed.is_empty());
        assert_eq!(filtered.n_features(), 4);
        assert_eq!(filtered.n_observations(), 4);
    }

    #[test]
    fn test_all_missing_is_too_strict_on_both_axes() {
        let data = DMatrix::from_element(3, 3, f64::NAN);
        for axis in [Axis::Observations, Axis::Features] {
            let err = threshold_keep_mask(&data, axis, 0.5).unwrap_err();
            assert!(matches!(
                err,
                NormalizeError::ThresholdTooStrict { axis: a, .. } if a == axis
            ));
        }
    }
}
