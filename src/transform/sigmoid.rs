//! Column-wise squashing transforms.
//!
//! Each transform normalizes one feature column at a time so heterogeneous
//! feature scales become comparable. Statistics ignore missing entries;
//! missing entries stay missing. A column whose statistics degenerate (zero
//! spread) comes back entirely NaN, which is why the pipeline re-runs its
//! degeneracy sweeps after normalization.

use crate::stats::{nan_iqr, nan_mean, nan_median, nan_std};
use nalgebra::DMatrix;
use rayon::prelude::*;

fn apply_columnwise<F>(data: &DMatrix<f64>, transform: F) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> Vec<f64> + Sync,
{
    let columns: Vec<Vec<f64>> = (0..data.ncols())
        .into_par_iter()
        .map(|j| {
            let column: Vec<f64> = data.column(j).iter().copied().collect();
            transform(&column)
        })
        .collect();

    DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| columns[j][i])
}

fn col_zscore(column: &[f64]) -> Vec<f64> {
    let mean = nan_mean(column);
    let std = nan_std(column);
    if !(std > 0.0) {
        return vec![f64::NAN; column.len()];
    }
    column.iter().map(|&v| (v - mean) / std).collect()
}

fn col_sigmoid(column: &[f64]) -> Vec<f64> {
    let mean = nan_mean(column);
    let std = nan_std(column);
    if !(std > 0.0) {
        return vec![f64::NAN; column.len()];
    }
    column
        .iter()
        .map(|&v| 1.0 / (1.0 + (-(v - mean) / std).exp()))
        .collect()
}

fn col_scaled_robust_sigmoid(column: &[f64]) -> Vec<f64> {
    let median = nan_median(column);
    let iqr = nan_iqr(column);
    if !(iqr > 0.0) {
        return vec![f64::NAN; column.len()];
    }
    let scale = iqr / 1.35;
    let squashed: Vec<f64> = column
        .iter()
        .map(|&v| 1.0 / (1.0 + (-(v - median) / scale).exp()))
        .collect();

    // Rescale the good entries to the unit interval.
    let min = squashed.iter().copied().filter(|v| !v.is_nan()).fold(f64::INFINITY, f64::min);
    let max = squashed
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if !(max > min) {
        return vec![f64::NAN; column.len()];
    }
    squashed.iter().map(|&v| (v - min) / (max - min)).collect()
}

fn col_mixed_sigmoid(column: &[f64]) -> Vec<f64> {
    let std = nan_std(column);
    if !(std > 0.0) {
        return vec![f64::NAN; column.len()];
    }
    if nan_iqr(column) > 0.0 {
        col_scaled_robust_sigmoid(column)
    } else {
        col_sigmoid(column)
    }
}

/// Z-score each column: (x - mean) / std over the good entries.
pub fn norm_zscore(data: &DMatrix<f64>) -> DMatrix<f64> {
    apply_columnwise(data, col_zscore)
}

/// Standard sigmoid of the z-score, mapping each column into (0, 1).
pub fn norm_sigmoid(data: &DMatrix<f64>) -> DMatrix<f64> {
    apply_columnwise(data, col_sigmoid)
}

/// Outlier-robust sigmoid (median and IQR based), rescaled to the unit
/// interval. Columns with zero IQR come back entirely NaN.
pub fn norm_scaled_robust_sigmoid(data: &DMatrix<f64>) -> DMatrix<f64> {
    apply_columnwise(data, col_scaled_robust_sigmoid)
}

/// Robust sigmoid where the IQR is informative, standard sigmoid where the
/// IQR collapses but the standard deviation does not. The default transform.
pub fn norm_mixed_sigmoid(data: &DMatrix<f64>) -> DMatrix<f64> {
    apply_columnwise(data, col_mixed_sigmoid)
}
