//! Removal of degenerate (constant or empty) feature columns.

use crate::data::FeatureSet;
use crate::error::{NormalizeError, Result};
use crate::stats::nan_std;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Columns whose NaN-ignoring standard deviation falls below this tolerance
/// carry no discriminating signal and are treated as constant.
pub const NEAR_CONSTANT_TOL: f64 = 10.0 * f64::EPSILON;

/// Result of a column-degeneracy pass, for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegeneracyOutcome {
    /// Columns before the pass.
    pub n_before: usize,
    /// Columns after the pass.
    pub n_after: usize,
    /// Names of removed features.
    pub removed: Vec<String>,
}

impl std::fmt::Display for DegeneracyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "features: {} -> {} ({} removed)",
            self.n_before,
            self.n_after,
            self.removed.len()
        )
    }
}

fn keep_columns(
    set: &FeatureSet,
    keep: Vec<bool>,
    empty_error: NormalizeError,
) -> Result<(FeatureSet, DegeneracyOutcome)> {
    let keep_indices: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter(|(_, &k)| k)
        .map(|(j, _)| j)
        .collect();

    if keep_indices.is_empty() {
        return Err(empty_error);
    }

    let removed: Vec<String> = keep
        .iter()
        .enumerate()
        .filter(|(_, &k)| !k)
        .map(|(j, _)| set.operations()[j].name.clone())
        .collect();

    let n_before = keep.len();
    let n_after = keep_indices.len();
    let filtered = if removed.is_empty() {
        set.clone()
    } else {
        set.subset_columns(&keep_indices)?
    };

    Ok((
        filtered,
        DegeneracyOutcome {
            n_before,
            n_after,
            removed,
        },
    ))
}

/// Drop columns that are near-constant across all observations.
///
/// The standard deviation ignores missing values; values differing by less
/// than [`NEAR_CONSTANT_TOL`] are treated as equal. With fewer than 2
/// observations variance is meaningless, so the pass is skipped entirely.
/// If every column is near-constant the run fails.
pub fn drop_near_constant(set: &FeatureSet) -> Result<(FeatureSet, DegeneracyOutcome)> {
    let n_features = set.n_features();
    if set.n_observations() < 2 {
        warn!("fewer than 2 observations; skipping near-constant feature check");
        return Ok((
            set.clone(),
            DegeneracyOutcome {
                n_before: n_features,
                n_after: n_features,
                removed: Vec::new(),
            },
        ));
    }

    let keep: Vec<bool> = (0..n_features)
        .into_par_iter()
        .map(|j| !(nan_std(&set.column(j)) < NEAR_CONSTANT_TOL))
        .collect();

    let (filtered, outcome) = keep_columns(set, keep, NormalizeError::AllFeaturesDegenerate)?;
    info!("near-constant sweep: {}", outcome);
    Ok((filtered, outcome))
}

/// Drop columns that are near-constant within any declared class.
///
/// Classes are the distinct `group` labels on the observation metadata; rows
/// without a label belong to no class, and classes with fewer than 2 members
/// are ignored (their variance is undefined). If no row carries a label, or
/// every class is a singleton, the pass is skipped with a diagnostic rather
/// than an error.
pub fn drop_class_degenerate(set: &FeatureSet) -> Result<(FeatureSet, DegeneracyOutcome)> {
    let mut classes: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, info) in set.time_series().iter().enumerate() {
        if let Some(group) = &info.group {
            classes.entry(group.as_str()).or_default().push(i);
        }
    }

    let n_features = set.n_features();
    if classes.is_empty() {
        warn!("no class labels on observations; skipping class-variance filtering");
        return Ok((
            set.clone(),
            DegeneracyOutcome {
                n_before: n_features,
                n_after: n_features,
                removed: Vec::new(),
            },
        ));
    }

    let class_rows: Vec<&Vec<usize>> = classes.values().filter(|rows| rows.len() >= 2).collect();
    if class_rows.is_empty() {
        warn!("no class has 2 or more members; skipping class-variance filtering");
        return Ok((
            set.clone(),
            DegeneracyOutcome {
                n_before: n_features,
                n_after: n_features,
                removed: Vec::new(),
            },
        ));
    }

    let keep: Vec<bool> = (0..n_features)
        .into_par_iter()
        .map(|j| {
            let column = set.column(j);
            !class_rows.iter().any(|rows| {
                let values: Vec<f64> = rows.iter().map(|&i| column[i]).collect();
                nan_std(&values) < NEAR_CONSTANT_TOL
            })
        })
        .collect();

    let (filtered, outcome) = keep_columns(set, keep, NormalizeError::AllFeaturesClassDegenerate)?;
    info!(
        "class-variance sweep over {} classes: {}",
        classes.len(),
        outcome
    );
    Ok((filtered, outcome))
}

/// Drop columns in which every entry is missing.
///
/// Run after normalization, which can collapse a column entirely to NaN. If
/// that happened to every column the run fails.
pub fn drop_all_missing(set: &FeatureSet) -> Result<(FeatureSet, DegeneracyOutcome)> {
    let keep: Vec<bool> = (0..set.n_features())
        .into_par_iter()
        .map(|j| set.column(j).iter().any(|v| !v.is_nan()))
        .collect();

    let (filtered, outcome) =
        keep_columns(set, keep, NormalizeError::AllColumnsBadAfterNormalization)?;
    info!("all-missing sweep: {}", outcome);
    Ok((filtered, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{OperationInfo, TimeSeriesInfo};
    use nalgebra::DMatrix;

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
    fn test_constant_column_removed() {
        // Column 1 is constant at 3.0 for all rows.
        let data = DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 3.0, 10.0, //
                2.0, 3.0, 20.0, //
                3.0, 3.0, 30.0, //
                4.0, 3.0, 40.0,
            ],
        );
        let set = make_set(data);
        let (filtered, outcome) = drop_near_constant(&set).unwrap();

        assert_eq!(filtered.n_features(), 2);
        assert_eq!(outcome.removed, vec!["op_1"]);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let data = DMatrix::from_row_slice(3, 3, &[1.0, 5.0, 5.0, 2.0, 5.0, 6.0, 3.0, 5.0, 7.0]);
        let set = make_set(data);
        let (once, _) = drop_near_constant(&set).unwrap();
        let (twice, outcome) = drop_near_constant(&once).unwrap();

        assert_eq!(once.n_features(), twice.n_features());
        assert!(outcome.removed.is_empty());
        for j in 0..twice.n_features() {
            assert!(!(nan_std(&twice.column(j)) < NEAR_CONSTANT_TOL));
        }
    }

    #[test]
    fn test_all_constant_is_fatal() {
        let data = DMatrix::from_element(3, 2, 7.0);
        let set = make_set(data);
        assert!(matches!(
            drop_near_constant(&set),
            Err(NormalizeError::AllFeaturesDegenerate)
        ));
    }

    #[test]
    fn test_single_observation_skips_pass() {
        let data = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let set = make_set(data);
        let (filtered, outcome) = drop_near_constant(&set).unwrap();
        assert_eq!(filtered.n_features(), 3);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_missing_values_ignored_in_std() {
        // Column 0 varies only through its good entries.
        let data = DMatrix::from_row_slice(
            3,
            2,
            &[1.0, 4.0, f64::NAN, 4.0, 2.0, f64::NAN],
        );
        let set = make_set(data);
        let (filtered, _) = drop_near_constant(&set).unwrap();
        // Column 0 varies (1.0 vs 2.0); column 1 is constant over its good
        // entries (4.0, 4.0) and gets dropped.
        assert_eq!(filtered.n_features(), 1);
        assert_eq!(filtered.operations()[0].name, "op_0");
    }

    fn make_grouped_set(data: DMatrix<f64>, groups: &[&str]) -> FeatureSet {
        let time_series = groups
            .iter()
            .enumerate()
            .map(|(i, g)| TimeSeriesInfo::with_group(format!("ts_{}", i), *g))
            .collect();
        let operations = (0..data.ncols())
            .map(|j| OperationInfo::new(format!("op_{}", j), j))
            .collect();
        FeatureSet::without_quality(data, time_series, operations).unwrap()
    }

    #[test]
    fn test_class_constant_column_removed() {
        // Column 0 is constant within class "a" but varies overall.
        let data = DMatrix::from_row_slice(
            4,
            2,
            &[
                5.0, 1.0, //
                5.0, 2.0, //
                8.0, 3.0, //
                9.0, 4.0,
            ],
        );
        let set = make_grouped_set(data, &["a", "a", "b", "b"]);
        let (filtered, outcome) = drop_class_degenerate(&set).unwrap();

        assert_eq!(filtered.n_features(), 1);
        assert_eq!(outcome.removed, vec!["op_0"]);
    }

    #[test]
    fn test_unlabeled_set_skips_class_pass() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 1.0]);
        let set = make_set(data);
        let (filtered, outcome) = drop_class_degenerate(&set).unwrap();
        assert_eq!(filtered.n_features(), 2);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_singleton_classes_skip_class_pass() {
        // Every label is unique, so no class has a defined within-class
        // variance; the pass keeps everything, even a constant column.
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 7.0, 2.0, 7.0, 3.0, 7.0]);
        let set = make_grouped_set(data, &["a", "b", "c"]);
        let (filtered, outcome) = drop_class_degenerate(&set).unwrap();
        assert_eq!(filtered.n_features(), 2);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_all_class_constant_is_fatal() {
        let data = DMatrix::from_row_slice(4, 1, &[5.0, 5.0, 9.0, 9.0]);
        let set = make_grouped_set(data, &["a", "a", "b", "b"]);
        assert!(matches!(
            drop_class_degenerate(&set),
            Err(NormalizeError::AllFeaturesClassDegenerate)
        ));
    }

    #[test]
    fn test_all_missing_column_dropped() {
        let data = DMatrix::from_row_slice(
            2,
            2,
            &[1.0, f64::NAN, 2.0, f64::NAN],
        );
        let set = make_set(data);
        let (filtered, outcome) = drop_all_missing(&set).unwrap();
        assert_eq!(filtered.n_features(), 1);
        assert_eq!(outcome.removed, vec!["op_1"]);
    }

    #[test]
    fn test_entirely_missing_matrix_is_fatal() {
        let data = DMatrix::from_element(2, 2, f64::NAN);
        let set = make_set(data);
        assert!(matches!(
            drop_all_missing(&set),
            Err(NormalizeError::AllColumnsBadAfterNormalization)
        ));
    }
}
