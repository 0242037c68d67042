//! Column access helpers shared by the pipeline stages
//!
//! Tables are polars `DataFrame`s. Stages never mutate their input: they
//! read columns through these helpers and assemble a fresh frame.

use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Label used for null categorical values
pub const MISSING_CATEGORY: &str = "unknown";

/// Per-column count of rows rejected by a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDrops {
    pub column: String,
    pub count: usize,
}

/// Column names of a table in declaration order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Look up a column, reporting the stage that needed it when absent
pub fn require_column<'a>(df: &'a DataFrame, name: &str, stage: &'static str) -> Result<&'a Column> {
    df.column(name).map_err(|_| PipelineError::Schema {
        stage,
        column: name.to_string(),
        available: column_names(df),
    })
}

/// Whether a dtype can be read as `f64` without parsing
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric() || matches!(dtype, DataType::Boolean)
}

/// Read a numeric column as `f64`, keeping nulls
pub fn numeric_values(df: &DataFrame, name: &str, stage: &'static str) -> Result<Vec<Option<f64>>> {
    let column = require_column(df, name, stage)?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(PipelineError::coercion(
            name,
            format!("expected a numeric column, found {}", column.dtype()),
        ));
    }

    let cast = column.cast(&DataType::Float64)?;
    let values = cast.f64()?.iter().collect();
    Ok(values)
}

/// Read a numeric column as `f64`, rejecting nulls
pub fn dense_values(df: &DataFrame, name: &str, stage: &'static str) -> Result<Vec<f64>> {
    let values = numeric_values(df, name, stage)?;
    let nulls = values.iter().filter(|v| v.is_none()).count();
    if nulls > 0 {
        return Err(PipelineError::coercion(
            name,
            format!("contains {} null value(s); coerce the column before analysis", nulls),
        ));
    }
    Ok(values.into_iter().flatten().collect())
}

/// Read any column as category labels, mapping nulls to [`MISSING_CATEGORY`]
pub fn category_labels(column: &Column) -> Result<Vec<String>> {
    category_labels_with(column, MISSING_CATEGORY)
}

/// Read any column as category labels, mapping nulls to `missing`
pub fn category_labels_with(column: &Column, missing: &str) -> Result<Vec<String>> {
    let cast = column.cast(&DataType::String)?;
    let labels = cast
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(missing).to_string())
        .collect();
    Ok(labels)
}

/// Build a new table where same-named columns are swapped for `replacements`
pub fn with_replaced_columns(df: &DataFrame, replacements: Vec<Column>) -> Result<DataFrame> {
    let mut by_name: HashMap<String, Column> = replacements
        .into_iter()
        .map(|c| (c.name().to_string(), c))
        .collect();

    let columns: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|c| by_name.remove(c.name().as_str()).unwrap_or_else(|| c.clone()))
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Keep the rows whose mask entry is `true`, preserving order
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_fill_nulls() {
        let column = Column::new("brand".into(), [Some("audi"), None, Some("bmw")]);
        let labels = category_labels(&column).unwrap();
        assert_eq!(labels, vec!["audi", MISSING_CATEGORY, "bmw"]);
    }

    #[test]
    fn test_dense_values_rejects_nulls() {
        let df = df! { "x" => [Some(1.0f64), None] }.unwrap();
        let err = dense_values(&df, "x", "test").unwrap_err();
        assert!(matches!(err, PipelineError::Coercion { .. }));
    }

    #[test]
    fn test_require_column_names_stage() {
        let df = df! { "a" => [1i64] }.unwrap();
        let err = require_column(&df, "b", "aggregate").unwrap_err();
        assert!(err.to_string().contains("[aggregate]"));
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_filter_rows_keeps_order() {
        let df = df! { "a" => [1i64, 2, 3, 4] }.unwrap();
        let out = filter_rows(&df, &[true, false, true, true]).unwrap();
        let values: Vec<Option<i64>> = out.column("a").unwrap().i64().unwrap().iter().collect();
        assert_eq!(values, vec![Some(1), Some(3), Some(4)]);
    }
}
