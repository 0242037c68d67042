//! Field coercion: strip unit and format noise and convert to typed columns
//!
//! Rows whose decorated text cannot be parsed are filtered out and counted,
//! never zero-filled. Only a structurally absent column is an error.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::schema::{Schema, SemanticType};
use super::table::{
    category_labels_with, filter_rows, is_numeric_dtype, with_replaced_columns, ColumnDrops,
    MISSING_CATEGORY,
};
use crate::error::{PipelineError, Result};

/// Formats tried for temporal columns when none is configured
const DEFAULT_TEMPORAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d"];

/// Largest magnitude stored as Int64 without losing precision in f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Options shared by all coerced columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionOptions {
    /// Digit group separator removed before parsing
    pub thousands_separator: char,
    /// Label substituted for null categorical values
    pub missing_label: String,
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            thousands_separator: ',',
            missing_label: MISSING_CATEGORY.to_string(),
        }
    }
}

/// Diagnostics from one coercion pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoercionReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub dropped_rows: usize,
    /// Parse failures per column; a row failing in two columns counts in both
    pub failures: Vec<ColumnDrops>,
}

/// Coerced table plus its diagnostics
#[derive(Debug, Clone)]
pub struct CoercionOutcome {
    pub table: DataFrame,
    pub report: CoercionReport,
}

struct Coerced {
    column: Column,
    valid: Vec<bool>,
}

/// Coerce every schema column of a normalized table to its semantic type.
///
/// Currency and distance columns lose their symbol, unit and thousands
/// separators; plain numeric columns lose separators; temporal columns are
/// parsed to `Datetime(ms)`; categorical columns become strings with nulls
/// replaced by the missing label. Columns that already carry the target
/// dtype pass through, so re-running on clean output changes nothing.
pub fn coerce_fields(df: &DataFrame, schema: &Schema, options: &CoercionOptions) -> Result<CoercionOutcome> {
    let input_rows = df.height();
    let mut keep = vec![true; input_rows];
    let mut replacements: Vec<Column> = Vec::with_capacity(schema.fields().len());
    let mut failures: Vec<ColumnDrops> = Vec::new();

    for field in schema.fields() {
        let name = field.canonical.as_str();
        let column = df
            .column(name)
            .map_err(|_| PipelineError::coercion(name, "declared column is absent from the table"))?;

        let coerced = match &field.kind {
            SemanticType::Categorical => Coerced {
                column: Column::new(
                    name.into(),
                    category_labels_with(column, &options.missing_label)?,
                ),
                valid: vec![true; input_rows],
            },
            SemanticType::Numeric => coerce_numeric(column, &[], options.thousands_separator)?,
            SemanticType::Currency { symbol } => {
                coerce_numeric(column, &[symbol.as_str()], options.thousands_separator)?
            }
            SemanticType::Distance { unit } => {
                coerce_numeric(column, &[unit.as_str()], options.thousands_separator)?
            }
            SemanticType::Temporal { format } => coerce_temporal(column, format.as_deref())?,
        };

        let failed = coerced.valid.iter().filter(|v| !**v).count();
        if failed > 0 {
            debug!(column = name, failed, "unparseable values");
            failures.push(ColumnDrops {
                column: name.to_string(),
                count: failed,
            });
        }
        for (k, v) in keep.iter_mut().zip(coerced.valid.iter()) {
            *k &= *v;
        }
        replacements.push(coerced.column);
    }

    let table = filter_rows(&with_replaced_columns(df, replacements)?, &keep)?;
    let output_rows = table.height();
    let dropped_rows = input_rows - output_rows;
    if dropped_rows > 0 {
        warn!(dropped_rows, input_rows, "coercion dropped unparseable rows");
    }

    Ok(CoercionOutcome {
        table,
        report: CoercionReport {
            input_rows,
            output_rows,
            dropped_rows,
            failures,
        },
    })
}

/// Strip decorations and separators from `raw` and parse what remains.
///
/// Returns `None` for empty, non-numeric or non-finite text.
pub fn parse_decorated_number(raw: &str, decorations: &[&str], thousands_separator: char) -> Option<f64> {
    let mut text = raw.trim().to_string();
    for decoration in decorations.iter().filter(|d| !d.is_empty()) {
        text = text.replace(decoration, "");
    }
    text.retain(|c| c != thousands_separator);

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a timestamp into epoch milliseconds
pub fn parse_timestamp(raw: &str, format: Option<&str>) -> Option<i64> {
    let raw = raw.trim();
    let parse_with = |fmt: &str| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(|dt| dt.and_utc().timestamp_millis())
    };

    match format {
        Some(fmt) => parse_with(fmt),
        None => DEFAULT_TEMPORAL_FORMATS.iter().find_map(|fmt| parse_with(fmt)),
    }
}

fn coerce_numeric(column: &Column, decorations: &[&str], thousands_separator: char) -> Result<Coerced> {
    let name = column.name().clone();

    if is_numeric_dtype(column.dtype()) {
        let cast = column.cast(&DataType::Float64)?;
        let valid = cast
            .f64()?
            .iter()
            .map(|v| v.is_some_and(|x| x.is_finite()))
            .collect();
        return Ok(Coerced {
            column: column.clone(),
            valid,
        });
    }

    if !matches!(
        column.dtype(),
        DataType::String | DataType::Null | DataType::Categorical(_, _)
    ) {
        return Err(PipelineError::coercion(
            name.as_str(),
            format!("cannot coerce {} to a number", column.dtype()),
        ));
    }

    let text = column.cast(&DataType::String)?;
    let parsed: Vec<Option<f64>> = text
        .str()?
        .into_iter()
        .map(|v| v.and_then(|s| parse_decorated_number(s, decorations, thousands_separator)))
        .collect();
    let valid: Vec<bool> = parsed.iter().map(Option::is_some).collect();

    let integral = parsed
        .iter()
        .flatten()
        .all(|v| v.fract() == 0.0 && v.abs() < MAX_EXACT_INTEGER);

    let column = if integral {
        let ints: Vec<Option<i64>> = parsed.iter().map(|v| v.map(|x| x as i64)).collect();
        Column::new(name, ints)
    } else {
        Column::new(name, parsed)
    };

    Ok(Coerced { column, valid })
}

fn coerce_temporal(column: &Column, format: Option<&str>) -> Result<Coerced> {
    let name = column.name().clone();

    if matches!(column.dtype(), DataType::Datetime(_, _) | DataType::Date) {
        let valid = column
            .as_materialized_series()
            .is_not_null()
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect();
        return Ok(Coerced {
            column: column.clone(),
            valid,
        });
    }

    if !matches!(column.dtype(), DataType::String | DataType::Null) {
        return Err(PipelineError::coercion(
            name.as_str(),
            format!("cannot coerce {} to a timestamp", column.dtype()),
        ));
    }

    let text = column.cast(&DataType::String)?;
    let millis: Vec<Option<i64>> = text
        .str()?
        .into_iter()
        .map(|v| v.and_then(|s| parse_timestamp(s, format)))
        .collect();
    let valid: Vec<bool> = millis.iter().map(Option::is_some).collect();

    let column = Column::new(name, millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    Ok(Coerced { column, valid })
}
