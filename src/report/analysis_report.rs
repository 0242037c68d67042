//! JSON report of a complete analysis run
//!
//! Records the settings the run used, how many rows each cleaning stage
//! removed and why, and the results of both analysis branches.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::pipeline::{
    AggregateResult, AnalysisOutcome, ColumnDrops, ColumnShares, ColumnSummary, GroupCorrelation, ModelArtifact,
};
use crate::report::CleaningSummary;

/// Settings that shaped the run
#[derive(Debug, Clone, Serialize)]
pub struct RunSettings {
    pub encoding: String,
    pub separator: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub autolens_version: String,
    pub input_file: String,
    pub settings: RunSettings,
}

/// Rows removed by one cleaning stage
#[derive(Debug, Clone, Serialize)]
pub struct StageDrops {
    pub dropped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub by_column: Vec<ColumnDrops>,
}

/// Row counts through the cleaning stages
#[derive(Debug, Clone, Serialize)]
pub struct CleaningSection {
    pub loaded_rows: usize,
    pub coercion: StageDrops,
    pub ranges: StageDrops,
    pub final_rows: usize,
}

/// Aggregation branch results
#[derive(Debug, Clone, Serialize)]
pub struct AggregationSection {
    pub groups: Vec<String>,
    pub aggregates: Vec<AggregateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<GroupCorrelation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<ColumnSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shares: Vec<ColumnShares>,
}

/// Complete analysis report
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub cleaning: CleaningSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelArtifact>,
}

/// Assemble the report for a finished run
pub fn build_report(input: &Path, config: &AnalysisConfig, outcome: &AnalysisOutcome) -> AnalysisReport {
    let summary = CleaningSummary::from_outcome(outcome);

    let settings = RunSettings {
        encoding: config.input.encoding.clone(),
        separator: config.input.separator,
        group_by: config.aggregation.as_ref().map(|a| a.group_by.clone()),
        min_share: config.aggregation.as_ref().map(|a| a.min_share),
        target: config.regression.as_ref().map(|r| r.target.clone()),
        test_ratio: config.regression.as_ref().map(|r| r.split.test_ratio),
        seed: config.regression.as_ref().map(|r| r.split.seed),
    };

    AnalysisReport {
        metadata: ReportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            autolens_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input.display().to_string(),
            settings,
        },
        cleaning: CleaningSection {
            loaded_rows: summary.loaded_rows,
            coercion: StageDrops {
                dropped: summary.dropped_coercion,
                by_column: nonzero(summary.coercion_failures),
            },
            ranges: StageDrops {
                dropped: summary.dropped_ranges,
                by_column: nonzero(summary.range_violations),
            },
            final_rows: summary.final_rows,
        },
        aggregation: outcome.aggregation.as_ref().map(|a| AggregationSection {
            groups: a.groups.clone(),
            aggregates: a.aggregates.clone(),
            correlation: a.correlation.clone(),
            summaries: a.summaries.clone(),
            shares: a.shares.clone(),
        }),
        model: outcome.model.clone(),
    }
}

/// Write the report as pretty-printed JSON
pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize analysis report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write analysis report: {}", path.display()))?;
    Ok(())
}

fn nonzero(drops: Vec<ColumnDrops>) -> Vec<ColumnDrops> {
    drops.into_iter().filter(|d| d.count > 0).collect()
}
