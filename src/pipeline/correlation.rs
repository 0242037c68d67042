//! Correlation between aggregated group means

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::aggregate::AggregateResult;
use crate::error::{PipelineError, Result};

/// One group present in both aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedMeans {
    pub key: String,
    pub left: f64,
    pub right: f64,
}

/// Pearson correlation between the means of two aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCorrelation {
    pub key_column: String,
    pub left_column: String,
    pub right_column: String,
    /// Always within [-1, 1]
    pub coefficient: f64,
    /// Paired rows in the left aggregate's group order
    pub pairs: Vec<PairedMeans>,
}

/// Correlate the group means of two aggregates, pairing by group key.
///
/// Groups present in only one aggregate are skipped. Fewer than two
/// paired groups, or a constant series, leave the coefficient undefined
/// and are reported as insufficient data.
pub fn correlate_group_means(left: &AggregateResult, right: &AggregateResult) -> Result<GroupCorrelation> {
    if left.key_column != right.key_column {
        return Err(PipelineError::InvalidConfig(format!(
            "cannot pair aggregates keyed by '{}' and '{}'",
            left.key_column, right.key_column
        )));
    }

    let right_means: HashMap<&str, f64> = right
        .groups
        .iter()
        .map(|g| (g.key.as_str(), g.mean))
        .collect();

    let pairs: Vec<PairedMeans> = left
        .groups
        .iter()
        .filter_map(|g| {
            right_means.get(g.key.as_str()).map(|&r| PairedMeans {
                key: g.key.clone(),
                left: g.mean,
                right: r,
            })
        })
        .collect();

    if pairs.len() < 2 {
        return Err(PipelineError::insufficient(
            "correlation",
            format!("{} paired group(s); at least 2 are required", pairs.len()),
        ));
    }

    let xs: Vec<f64> = pairs.iter().map(|p| p.left).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.right).collect();
    let coefficient = pearson_correlation(&xs, &ys).ok_or_else(|| {
        PipelineError::insufficient("correlation", "one of the paired series has zero variance")
    })?;

    debug!(
        left = left.value_column.as_str(),
        right = right.value_column.as_str(),
        pairs = pairs.len(),
        coefficient,
        "correlated group means"
    );

    Ok(GroupCorrelation {
        key_column: left.key_column.clone(),
        left_column: left.value_column.clone(),
        right_column: right.value_column.clone(),
        coefficient,
        pairs,
    })
}

/// Compute Pearson correlation using Welford's algorithm
///
/// Single pass for numerical stability. Returns `None` for mismatched
/// lengths, fewer than two points, or zero variance. The result is clamped
/// to [-1, 1] to absorb rounding.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }

    let mut count = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (&x, &y) in xs.iter().zip(ys.iter()) {
        count += 1.0;
        let dx = x - mean_x;
        let dy = y - mean_y;
        mean_x += dx / count;
        mean_y += dy / count;
        var_x += dx * (x - mean_x);
        var_y += dy * (y - mean_y);
        cov_xy += dx * (y - mean_y);
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    let r = cov_xy / (var_x.sqrt() * var_y.sqrt());
    if r.is_nan() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_perfect_positive() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[30.0, 20.0, 10.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_series() {
        assert!(pearson_correlation(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_none());
    }

    #[test]
    fn test_pearson_too_short() {
        assert!(pearson_correlation(&[1.0], &[1.0]).is_none());
        assert!(pearson_correlation(&[1.0, 2.0], &[1.0]).is_none());
    }
}
