//! Standardised mean differences between two independent samples.

use crate::error::{MetricsError, MetricsResult};
use crate::utils::{ensure_sample, is_near_zero, mean, sum_of_squares};

/// Pooled standard deviation of two samples (ddof = 1 within each group).
///
/// Fails when the samples are empty, contain non-finite values, or leave no
/// degrees of freedom.
pub fn pooled_std(a: &[f64], b: &[f64]) -> MetricsResult<f64> {
    ensure_sample(a, "a")?;
    ensure_sample(b, "b")?;
    let df = degrees_of_freedom(a, b)?;
    Ok(((sum_of_squares(a) + sum_of_squares(b)) / df as f64).sqrt())
}

/// Cohen's d for two independent samples.
///
/// `(mean(a) - mean(b)) / pooled_std(a, b)`. A pooled standard deviation
/// within [`ZERO_TOLERANCE`](crate::utils::ZERO_TOLERANCE) of zero leaves the
/// effect size undefined and is reported as an error.
///
/// # Example
///
/// ```
/// use design_metrics::stats::cohen_d;
///
/// let d = cohen_d(&[2.0, 4.0, 6.0], &[1.0, 3.0, 5.0]).unwrap();
/// assert!((d - 0.5).abs() < 1e-12);
/// ```
pub fn cohen_d(a: &[f64], b: &[f64]) -> MetricsResult<f64> {
    let pooled = pooled_std(a, b)?;
    if is_near_zero(pooled) {
        return Err(MetricsError::undefined(
            "Pooled standard deviation is zero; effect size undefined",
        ));
    }
    let d = (mean(a) - mean(b)) / pooled;
    tracing::debug!(n_a = a.len(), n_b = b.len(), d, "Computed Cohen's d");
    Ok(d)
}

/// Hedges' g: Cohen's d with the small-sample correction
/// `1 - 3 / (4·df - 1)`.
pub fn hedges_g(a: &[f64], b: &[f64]) -> MetricsResult<f64> {
    let d = cohen_d(a, b)?;
    let df = degrees_of_freedom(a, b)? as f64;
    let correction = 1.0 - 3.0 / (4.0f64.mul_add(df, -1.0));
    Ok(d * correction)
}

fn degrees_of_freedom(a: &[f64], b: &[f64]) -> MetricsResult<usize> {
    let n = a.len() + b.len();
    if n <= 2 {
        return Err(MetricsError::validation(
            "a, b",
            "need at least three observations in total for a pooled estimate",
        ));
    }
    Ok(n - 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pooled_std_equal_spread() {
        let s = pooled_std(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degrees_of_freedom_guard() {
        assert!(cohen_d(&[1.0], &[2.0]).is_err());
    }
}
