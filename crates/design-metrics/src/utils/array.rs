//! Helpers for one-dimensional numeric samples.

use crate::error::{MetricsError, MetricsResult};

/// Absolute tolerance below which a variance or spread counts as zero.
pub const ZERO_TOLERANCE: f64 = 1e-8;

/// Ensure every value is finite, naming `field` in the error.
pub fn ensure_finite(values: &[f64], field: &str) -> MetricsResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(MetricsError::validation(field, "must only contain finite numeric values"))
    }
}

/// Ensure the sample has at least one finite observation.
pub fn ensure_sample(values: &[f64], field: &str) -> MetricsResult<()> {
    if values.is_empty() {
        return Err(MetricsError::validation(field, "must contain at least one observation"));
    }
    ensure_finite(values, field)
}

/// Arithmetic mean. Returns 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
#[must_use]
pub fn sum_of_squares(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Variance with `ddof` delta degrees of freedom.
///
/// Returns `None` when `values.len() <= ddof`.
#[must_use]
pub fn variance(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    Some(sum_of_squares(values) / (values.len() - ddof) as f64)
}

/// True when `value` is within [`ZERO_TOLERANCE`] of zero.
#[must_use]
pub fn is_near_zero(value: f64) -> bool {
    value.abs() <= ZERO_TOLERANCE
}

/// Euclidean norm of a vector.
#[must_use]
pub fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
