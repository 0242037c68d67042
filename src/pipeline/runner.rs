//! End-to-end orchestration: clean once, then run both analysis branches
//!
//! Cleaning is sequential (normalize → coerce → filter). The aggregation
//! and regression branches only read the cleaned table, so they run side
//! by side on the rayon pool.

use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use super::aggregate::{aggregate_by_group, top_groups, AggregateResult, GroupSpec};
use super::coerce::{coerce_fields, CoercionReport};
use super::correlation::{correlate_group_means, GroupCorrelation};
use super::describe::{column_shares, describe_column, ColumnShares, ColumnSummary};
use super::encoder::encode_categorical;
use super::outliers::{filter_outliers, FilterReport};
use super::regression::{evaluate_regression, ModelArtifact};
use super::schema::normalize_schema;
use super::table::{dense_values, require_column};
use crate::config::{AggregationConfig, AnalysisConfig, RegressionConfig};
use crate::error::{PipelineError, Result};

/// Output of the cleaning stages
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub table: DataFrame,
    pub loaded_rows: usize,
    pub coercion: CoercionReport,
    pub filter: FilterReport,
}

/// Output of the aggregation branch
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationOutcome {
    /// Group keys that passed the share threshold, in first-seen order
    pub groups: Vec<String>,
    pub aggregates: Vec<AggregateResult>,
    pub correlation: Option<GroupCorrelation>,
    pub summaries: Vec<ColumnSummary>,
    pub shares: Vec<ColumnShares>,
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub cleaned: CleanedTable,
    pub aggregation: Option<AggregationOutcome>,
    pub model: Option<ModelArtifact>,
}

/// Normalize, coerce and range-filter a raw table
pub fn clean_table(raw: &DataFrame, config: &AnalysisConfig) -> Result<CleanedTable> {
    let normalized = normalize_schema(raw, &config.schema)?;
    let coerced = coerce_fields(&normalized, &config.schema, &config.coercion)?;
    let filtered = filter_outliers(&coerced.table, &config.ranges)?;

    info!(
        loaded = raw.height(),
        after_coercion = coerced.report.output_rows,
        after_filter = filtered.report.output_rows,
        "cleaned table"
    );

    Ok(CleanedTable {
        table: filtered.table,
        loaded_rows: raw.height(),
        coercion: coerced.report,
        filter: filtered.report,
    })
}

/// Aggregate each value column by the group key and correlate the requested pair
pub fn run_aggregation(df: &DataFrame, config: &AggregationConfig) -> Result<AggregationOutcome> {
    let groups = top_groups(df, &config.group_by, config.min_share)?;

    let aggregates = config
        .values
        .iter()
        .map(|value| {
            let spec = GroupSpec::new(&config.group_by, value)
                .with_min_share(config.min_share)
                .with_order(config.order);
            aggregate_by_group(df, &spec)
        })
        .collect::<Result<Vec<_>>>()?;

    let correlation = match &config.correlate {
        Some((left, right)) => {
            let find = |column: &str| {
                aggregates
                    .iter()
                    .find(|a| a.value_column == column)
                    .ok_or_else(|| {
                        PipelineError::InvalidConfig(format!(
                            "correlated column '{}' was not aggregated",
                            column
                        ))
                    })
            };
            Some(correlate_group_means(find(left.as_str())?, find(right.as_str())?)?)
        }
        None => None,
    };

    let summaries = config
        .describe
        .iter()
        .map(|column| describe_column(df, column))
        .collect::<Result<Vec<_>>>()?;

    let shares = config
        .shares
        .iter()
        .map(|column| column_shares(df, column))
        .collect::<Result<Vec<_>>>()?;

    info!(
        group_by = config.group_by.as_str(),
        groups = groups.len(),
        "aggregation branch complete"
    );

    Ok(AggregationOutcome {
        groups,
        aggregates,
        correlation,
        summaries,
        shares,
    })
}

/// Encode the configured features and evaluate a linear model of the target
pub fn run_regression(df: &DataFrame, config: &RegressionConfig) -> Result<ModelArtifact> {
    let feature_columns = config.feature_columns();
    for column in &feature_columns {
        require_column(df, column, "regression")?;
    }

    let features = df.select(feature_columns)?;
    let matrix = encode_categorical(&features, &config.categorical)?;
    let target = dense_values(df, &config.target, "regression")?;
    let model = evaluate_regression(&matrix, &target, &config.split)?;

    info!(
        target = config.target.as_str(),
        features = matrix.ncols(),
        r2 = model.test_metrics.r2,
        "regression branch complete"
    );
    Ok(model)
}

/// Run both branches over an already-cleaned table
pub fn run_branches(
    cleaned: &DataFrame,
    config: &AnalysisConfig,
) -> Result<(Option<AggregationOutcome>, Option<ModelArtifact>)> {
    let (aggregation, model) = rayon::join(
        || {
            config
                .aggregation
                .as_ref()
                .map(|c| run_aggregation(cleaned, c))
                .transpose()
        },
        || {
            config
                .regression
                .as_ref()
                .map(|c| run_regression(cleaned, c))
                .transpose()
        },
    );
    Ok((aggregation?, model?))
}

/// Validate the configuration, clean the raw table and run both branches
pub fn run_analysis(raw: &DataFrame, config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    config.validate()?;
    let cleaned = clean_table(raw, config)?;
    let (aggregation, model) = run_branches(&cleaned.table, config)?;
    Ok(AnalysisOutcome {
        cleaned,
        aggregation,
        model,
    })
}
