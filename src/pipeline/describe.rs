//! Descriptive statistics for single columns

use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use super::table::{category_labels, numeric_values, require_column};
use crate::error::{PipelineError, Result};

const STAGE: &str = "describe";

/// Distribution summary of a numeric column (nulls ignored)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent for a single value
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Frequency of one distinct value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueShare {
    pub value: String,
    pub count: usize,
    pub share: f64,
}

/// Value frequencies of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnShares {
    pub column: String,
    pub values: Vec<ValueShare>,
}

/// Summarise the non-null values of a numeric column
pub fn describe_column(df: &DataFrame, column: &str) -> Result<ColumnSummary> {
    let mut values: Vec<f64> = numeric_values(df, column, STAGE)?
        .into_iter()
        .flatten()
        .collect();

    if values.is_empty() {
        return Err(PipelineError::insufficient(
            "describe",
            format!("column '{}' has no non-null values", column),
        ));
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((ss / (count - 1) as f64).sqrt())
    } else {
        None
    };

    Ok(ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

/// Count each distinct value and its share of all rows, most frequent first
pub fn value_shares(df: &DataFrame, column: &str) -> Result<Vec<ValueShare>> {
    let labels = category_labels(require_column(df, column, STAGE)?)?;
    let total = labels.len();

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        let count = counts.entry(label.clone()).or_insert(0);
        if *count == 0 {
            order.push(label);
        }
        *count += 1;
    }

    let mut shares: Vec<ValueShare> = order
        .into_iter()
        .map(|value| {
            let count = counts[&value];
            ValueShare {
                share: count as f64 / total as f64,
                value,
                count,
            }
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(shares)
}

/// [`value_shares`] tagged with the column name
pub fn column_shares(df: &DataFrame, column: &str) -> Result<ColumnShares> {
    Ok(ColumnShares {
        column: column.to_string(),
        values: value_shares(df, column)?,
    })
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
    }
}
