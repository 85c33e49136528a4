//! Conversion of flagged and non-finite entries to the missing sentinel.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Outcome of the masking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskOutcome {
    /// Entries rewritten to NaN by this pass (previously finite values with a
    /// positive quality code, or non-NaN non-finite values).
    pub n_converted: usize,
    /// Total missing entries after masking, including pre-existing NaNs.
    pub n_missing: usize,
}

impl std::fmt::Display for MaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "masked {} entries ({} missing in total)",
            self.n_converted, self.n_missing
        )
    }
}

/// Rewrite every entry that is non-finite or carries a strictly positive
/// quality code to `NaN`.
///
/// Pure function: the inputs are untouched and a fresh matrix is returned
/// together with conversion counts for diagnostics.
pub fn mask_special_values(
    data: &DMatrix<f64>,
    quality: &DMatrix<u32>,
) -> (DMatrix<f64>, MaskOutcome) {
    let mut n_converted = 0usize;
    let mut n_missing = 0usize;

    let masked = DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| {
        let v = data[(i, j)];
        let bad = !v.is_finite() || quality[(i, j)] > 0;
        if bad {
            n_missing += 1;
            if !v.is_nan() {
                n_converted += 1;
            }
            f64::NAN
        } else {
            v
        }
    });

    (
        masked,
        MaskOutcome {
            n_converted,
            n_missing,
        },
    )
}
