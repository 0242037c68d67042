//! Deterministic range filtering of numeric columns
//!
//! Bounds are domain knowledge supplied by the caller. Rows outside a range
//! are dropped, never clamped, and no statistical detection is attempted.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::table::{filter_rows, numeric_values, ColumnDrops};
use crate::error::{PipelineError, Result};

const STAGE: &str = "filter";

/// Inclusive numeric bound for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidityRange {
    pub min: f64,
    pub max: f64,
}

impl ValidityRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let range = Self { min, max };
        range.check("<range>")?;
        Ok(range)
    }

    /// Inclusive containment test
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub(crate) fn check(&self, column: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "range for '{}' must have finite bounds, got [{}, {}]",
                column, self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(PipelineError::InvalidConfig(format!(
                "range for '{}' has min {} greater than max {}",
                column, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Diagnostics from one range-filter pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub dropped_rows: usize,
    /// Out-of-range values per column; a row violating two ranges counts in both
    pub violations: Vec<ColumnDrops>,
}

/// Filtered table plus its diagnostics
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: DataFrame,
    pub report: FilterReport,
}

/// Keep only rows where every constrained column lies inside its range.
///
/// Null values fail their range. A constrained column absent from the
/// table is a schema error.
pub fn filter_outliers(df: &DataFrame, ranges: &BTreeMap<String, ValidityRange>) -> Result<FilterOutcome> {
    let input_rows = df.height();
    let mut keep = vec![true; input_rows];
    let mut violations = Vec::new();

    for (column, range) in ranges {
        range.check(column)?;
        let values = numeric_values(df, column, STAGE)?;

        let mut violated = 0usize;
        for (k, v) in keep.iter_mut().zip(values.iter()) {
            let inside = v.is_some_and(|x| range.contains(x));
            if !inside {
                violated += 1;
            }
            *k &= inside;
        }

        debug!(column = column.as_str(), min = range.min, max = range.max, violated, "range check");
        if violated > 0 {
            violations.push(ColumnDrops {
                column: column.clone(),
                count: violated,
            });
        }
    }

    let table = filter_rows(df, &keep)?;
    let output_rows = table.height();
    let dropped_rows = input_rows - output_rows;
    if dropped_rows > 0 {
        warn!(dropped_rows, input_rows, "range filter dropped rows");
    }

    Ok(FilterOutcome {
        table,
        report: FilterReport {
            input_rows,
            output_rows,
            dropped_rows,
            violations,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let range = ValidityRange::new(1000.0, 1_000_000.0).unwrap();
        assert!(range.contains(1000.0));
        assert!(range.contains(1_000_000.0));
        assert!(!range.contains(999.99));
        assert!(!range.contains(1_000_000.01));
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(ValidityRange::new(10.0, 1.0).is_err());
        assert!(ValidityRange::new(f64::NAN, 1.0).is_err());
    }
}
