//! Analysis configuration
//!
//! Everything dataset-specific lives here: the raw → canonical schema, the
//! validity ranges, the grouping threshold and the train/test split. A
//! configuration is plain JSON; [`AnalysisConfig::legacy_listing`] is the
//! preset for the used-vehicle listing export.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::pipeline::{
    CoercionOptions, FieldSpec, GroupOrder, Schema, SemanticType, SplitConfig, ValidityRange,
};

/// How the raw input file is read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputOptions {
    /// WHATWG encoding label, e.g. `utf-8` or `latin1`
    pub encoding: String,
    /// Field delimiter (ASCII)
    pub separator: char,
    /// Rows used for CSV schema inference; 0 scans the whole file
    pub infer_schema_length: usize,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            separator: ',',
            infer_schema_length: 10000,
        }
    }
}

/// Grouped aggregation branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Categorical column used as the group key
    pub group_by: String,
    /// Numeric columns summarised per group
    pub values: Vec<String>,
    /// Keep groups holding strictly more than this share of rows
    #[serde(default)]
    pub min_share: f64,
    #[serde(default)]
    pub order: GroupOrder,
    /// Two entries of `values` whose group means are correlated
    #[serde(default)]
    pub correlate: Option<(String, String)>,
    /// Numeric columns to describe on the cleaned table
    #[serde(default)]
    pub describe: Vec<String>,
    /// Columns whose value frequencies are reported
    #[serde(default)]
    pub shares: Vec<String>,
}

/// Regression branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionConfig {
    pub target: String,
    #[serde(default)]
    pub numeric: Vec<String>,
    #[serde(default)]
    pub categorical: Vec<String>,
    #[serde(flatten)]
    pub split: SplitConfig,
}

impl RegressionConfig {
    /// Feature columns in matrix order: numeric first, then categorical
    pub fn feature_columns(&self) -> Vec<String> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .cloned()
            .collect()
    }
}

/// Complete configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub input: InputOptions,
    pub schema: Schema,
    #[serde(default)]
    pub coercion: CoercionOptions,
    #[serde(default)]
    pub ranges: BTreeMap<String, ValidityRange>,
    #[serde(default)]
    pub aggregation: Option<AggregationConfig>,
    #[serde(default)]
    pub regression: Option<RegressionConfig>,
}

impl AnalysisConfig {
    /// Preset for the used-vehicle listing export (camelCase header, `$`
    /// prices, `km` odometer readings, Latin-1 text).
    ///
    /// The price and registration-year bounds were read off that dataset's
    /// distribution and are not meant for other datasets.
    pub fn legacy_listing() -> Self {
        use SemanticType::*;

        let temporal = || Temporal { format: None };
        let schema = Schema::new(vec![
            FieldSpec::snake_case("dateCrawled", temporal()),
            FieldSpec::snake_case("name", Categorical),
            FieldSpec::snake_case(
                "price",
                Currency {
                    symbol: "$".to_string(),
                },
            ),
            FieldSpec::snake_case("abtest", Categorical),
            FieldSpec::snake_case("vehicleType", Categorical),
            FieldSpec::new("yearOfRegistration", "registration_year", Numeric),
            FieldSpec::snake_case("gearbox", Categorical),
            FieldSpec::snake_case("powerPS", Numeric),
            FieldSpec::snake_case("model", Categorical),
            FieldSpec::new(
                "odometer",
                "odometer_km",
                Distance {
                    unit: "km".to_string(),
                },
            ),
            FieldSpec::new("monthOfRegistration", "registration_month", Numeric),
            FieldSpec::snake_case("fuelType", Categorical),
            FieldSpec::snake_case("brand", Categorical),
            FieldSpec::new("notRepairedDamage", "unrepaired_damage", Categorical),
            FieldSpec::new("dateCreated", "ad_created", temporal()),
            FieldSpec::snake_case("postalCode", Numeric),
            FieldSpec::snake_case("lastSeen", temporal()),
        ]);

        let mut ranges = BTreeMap::new();
        ranges.insert(
            "price".to_string(),
            ValidityRange {
                min: 1000.0,
                max: 1_000_000.0,
            },
        );
        ranges.insert(
            "registration_year".to_string(),
            ValidityRange {
                min: 1900.0,
                max: 2016.0,
            },
        );

        Self {
            input: InputOptions {
                encoding: "latin1".to_string(),
                ..InputOptions::default()
            },
            schema,
            coercion: CoercionOptions::default(),
            ranges,
            aggregation: Some(AggregationConfig {
                group_by: "brand".to_string(),
                values: vec!["price".to_string(), "odometer_km".to_string()],
                min_share: 0.05,
                order: GroupOrder::MeanDescending,
                correlate: Some(("price".to_string(), "odometer_km".to_string())),
                describe: vec![
                    "price".to_string(),
                    "odometer_km".to_string(),
                    "registration_year".to_string(),
                ],
                shares: vec!["registration_year".to_string(), "odometer_km".to_string()],
            }),
            regression: Some(RegressionConfig {
                target: "price".to_string(),
                numeric: vec![
                    "registration_year".to_string(),
                    "power_ps".to_string(),
                    "odometer_km".to_string(),
                ],
                categorical: vec![
                    "brand".to_string(),
                    "fuel_type".to_string(),
                    "gearbox".to_string(),
                ],
                split: SplitConfig::default(),
            }),
        }
    }

    /// Read a configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Check ranges, thresholds and cross-references
    pub fn validate(&self) -> Result<()> {
        if !self.input.separator.is_ascii() {
            return Err(PipelineError::InvalidConfig(format!(
                "separator must be a single ASCII character, got '{}'",
                self.input.separator
            )));
        }

        self.schema.validate()?;

        for (column, range) in &self.ranges {
            range.check(column)?;
        }

        if let Some(aggregation) = &self.aggregation {
            if !(0.0..1.0).contains(&aggregation.min_share) {
                return Err(PipelineError::InvalidConfig(format!(
                    "group share threshold must be in [0, 1), got {}",
                    aggregation.min_share
                )));
            }
            if let Some((left, right)) = &aggregation.correlate {
                for column in [left, right] {
                    if !aggregation.values.contains(column) {
                        return Err(PipelineError::InvalidConfig(format!(
                            "correlated column '{}' is not among the aggregated values",
                            column
                        )));
                    }
                }
            }
        }

        if let Some(regression) = &self.regression {
            regression.split.validate()?;
            if regression.feature_columns().contains(&regression.target) {
                return Err(PipelineError::InvalidConfig(format!(
                    "target '{}' is also listed as a feature",
                    regression.target
                )));
            }
        }

        Ok(())
    }
}
