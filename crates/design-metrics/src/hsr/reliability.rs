//! Internal-consistency reliability.

use crate::error::{MetricsError, MetricsResult};
use crate::table::Table;
use crate::utils::{Matrix, is_near_zero, variance};

/// Cronbach's alpha for a participants × items response matrix.
///
/// `k/(k-1) · (1 - Σ var(item) / var(total))`, variances with ddof = 1.
/// Variances within [`ZERO_TOLERANCE`](crate::utils::ZERO_TOLERANCE) of zero
/// leave alpha undefined.
pub fn cronbach_alpha(responses: &Matrix) -> MetricsResult<f64> {
    let (participants, items) = responses.shape();
    if items < 2 {
        return Err(MetricsError::validation("responses", "Need at least two items"));
    }
    if participants < 2 {
        return Err(MetricsError::validation("responses", "Need at least two participants"));
    }
    responses.ensure_finite("responses")?;

    let item_variance: f64 = (0..items)
        .map(|c| variance(&responses.column(c), 1).unwrap_or(0.0))
        .sum();
    if is_near_zero(item_variance) {
        return Err(MetricsError::undefined("Item variances sum to zero"));
    }

    let totals: Vec<f64> = responses.iter_rows().map(|row| row.iter().sum()).collect();
    let total_variance = variance(&totals, 1).unwrap_or(0.0);
    if is_near_zero(total_variance) {
        return Err(MetricsError::undefined("Total score variance is zero"));
    }

    let k = items as f64;
    let alpha = (k / (k - 1.0)) * (1.0 - item_variance / total_variance);
    tracing::debug!(participants, items, alpha, "Computed Cronbach's alpha");
    Ok(alpha)
}

/// Cronbach's alpha over the named numeric columns of a survey table.
pub fn cronbach_alpha_table(responses: &Table, items: &[&str]) -> MetricsResult<f64> {
    cronbach_alpha(&responses.to_matrix(items, "responses")?)
}
