//! Pre-filtering profile of good-value proportions along each axis.

use crate::stats::good_fraction;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Range of good-value percentages across rows and across columns.
///
/// Computed before any filtering; the ranges tell the caller whether the
/// configured thresholds are realistic for this matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoodValueProfile {
    /// Lowest good-value percentage of any observation (row).
    pub row_min_pct: f64,
    /// Highest good-value percentage of any observation (row).
    pub row_max_pct: f64,
    /// Lowest good-value percentage of any feature (column).
    pub col_min_pct: f64,
    /// Highest good-value percentage of any feature (column).
    pub col_max_pct: f64,
}

impl std::fmt::Display for GoodValueProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "good values: observations {:.1}%-{:.1}%, features {:.1}%-{:.1}%",
            self.row_min_pct, self.row_max_pct, self.col_min_pct, self.col_max_pct
        )
    }
}

/// Compute the per-axis good-value percentage ranges of a masked matrix.
pub fn profile_good_values(data: &DMatrix<f64>) -> GoodValueProfile {
    let row_fractions: Vec<f64> = (0..data.nrows())
        .into_par_iter()
        .map(|i| {
            let row: Vec<f64> = data.row(i).iter().copied().collect();
            good_fraction(&row)
        })
        .collect();
    let col_fractions: Vec<f64> = (0..data.ncols())
        .into_par_iter()
        .map(|j| {
            let col: Vec<f64> = data.column(j).iter().copied().collect();
            good_fraction(&col)
        })
        .collect();

    let range = |fractions: &[f64]| {
        let min = fractions.iter().copied().fold(f64::INFINITY, f64::min);
        let max = fractions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if fractions.is_empty() {
            (0.0, 0.0)
        } else {
            (min * 100.0, max * 100.0)
        }
    };

    let (row_min_pct, row_max_pct) = range(&row_fractions);
    let (col_min_pct, col_max_pct) = range(&col_fractions);

    GoodValueProfile {
        row_min_pct,
        row_max_pct,
        col_min_pct,
        col_max_pct,
    }
}
