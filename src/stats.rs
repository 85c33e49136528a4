//! NaN-aware statistics over feature columns.
//!
//! Every helper here treats `NaN` as "missing" and computes over the good
//! entries only. A slice with no good entries yields `NaN`, never a panic.

/// Mean of the non-NaN entries, or NaN if there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in values {
        if !v.is_nan() {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Sample standard deviation (n-1 denominator) of the non-NaN entries.
///
/// Fewer than 2 good entries yields NaN.
pub fn nan_std(values: &[f64]) -> f64 {
    let mean = nan_mean(values);
    if mean.is_nan() {
        return f64::NAN;
    }
    let mut ss = 0.0;
    let mut n = 0usize;
    for &v in values {
        if !v.is_nan() {
            let d = v - mean;
            ss += d * d;
            n += 1;
        }
    }
    if n < 2 {
        f64::NAN
    } else {
        (ss / (n - 1) as f64).sqrt()
    }
}

/// Median of the non-NaN entries, or NaN if there are none.
pub fn nan_median(values: &[f64]) -> f64 {
    let mut good: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if good.is_empty() {
        return f64::NAN;
    }
    good.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = good.len();
    if n % 2 == 0 {
        (good[n / 2 - 1] + good[n / 2]) / 2.0
    } else {
        good[n / 2]
    }
}

/// Interquartile range (Q3 - Q1) of the non-NaN entries.
///
/// Quartiles use linear interpolation between order statistics, matching the
/// convention of most statistics packages.
pub fn nan_iqr(values: &[f64]) -> f64 {
    let mut good: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if good.is_empty() {
        return f64::NAN;
    }
    good.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    quantile_sorted(&good, 0.75) - quantile_sorted(&good, 0.25)
}

/// Linear-interpolation quantile of an already-sorted slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Proportion of non-NaN entries in a slice. Empty slices count as fully good.
pub fn good_fraction(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let good = values.iter().filter(|v| !v.is_nan()).count();
    good as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nan_mean_ignores_missing() {
        let values = [1.0, f64::NAN, 3.0, 5.0];
        assert_relative_eq!(nan_mean(&values), 3.0);
    }

    #[test]
    fn test_nan_mean_all_missing() {
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
    }

    #[test]
    fn test_nan_std_sample_denominator() {
        // std of [2, 4, 4, 4, 5, 5, 7, 9] with n-1 denominator
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(nan_std(&values), 2.13808993529939, epsilon = 1e-10);
    }

    #[test]
    fn test_nan_std_single_value() {
        assert!(nan_std(&[3.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_nan_median_even_odd() {
        assert_relative_eq!(nan_median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(nan_median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_relative_eq!(nan_median(&[4.0, f64::NAN, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_nan_iqr_constant() {
        assert_relative_eq!(nan_iqr(&[5.0, 5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_nan_iqr_interpolated() {
        // [1, 2, 3, 4]: Q1 = 1.75, Q3 = 3.25
        assert_relative_eq!(nan_iqr(&[1.0, 2.0, 3.0, 4.0]), 1.5, epsilon = 1e-10);
    }

    #[test]
    fn test_good_fraction() {
        assert_relative_eq!(good_fraction(&[1.0, f64::NAN, 3.0, f64::NAN]), 0.5);
        assert_relative_eq!(good_fraction(&[]), 1.0);
    }
}
