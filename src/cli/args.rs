//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;

/// autolens - Clean a tabular listing export, summarise it by group and
/// evaluate a linear price model
#[derive(Parser, Debug)]
#[command(name = "autolens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input file path (delimited text)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Analysis configuration (JSON). Defaults to the built-in listing preset.
    /// Write the preset with `autolens init-config` to start a new one.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report output path.
    /// Defaults to the input directory with an '_analysis.json' suffix (e.g., autos.csv → autos_analysis.json).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Text encoding of the input file (e.g., utf-8, latin1, windows-1252)
    #[arg(long)]
    pub encoding: Option<String>,

    /// Field separator of the input file
    #[arg(long)]
    pub separator: Option<char>,

    /// Keep groups holding strictly more than this share of rows (0.0 to 1.0)
    #[arg(long, value_parser = validate_min_share)]
    pub min_share: Option<f64>,

    /// Fraction of rows held out to evaluate the model (exclusive 0.0 to 1.0)
    #[arg(long, value_parser = validate_test_ratio)]
    pub test_ratio: Option<f64>,

    /// Seed for the train/test split; equal seeds reproduce the same split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of rows to use for schema inference.
    /// Use 0 for full table scan (slow for large files).
    #[arg(long)]
    pub infer_schema_length: Option<usize>,

    /// Skip writing the JSON report
    #[arg(long, default_value = "false")]
    pub no_report: bool,

    /// Log level for diagnostics on stderr (error, warn, info, debug, trace).
    /// RUST_LOG takes precedence when set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the built-in listing preset as a JSON configuration file
    InitConfig {
        /// Output file path (defaults to autolens.json in the current directory)
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the report path, deriving it from the input if not explicitly provided.
    /// Returns `None` when reporting is disabled or there is no input.
    pub fn report_path(&self) -> Option<PathBuf> {
        if self.no_report {
            return None;
        }
        let input = self.input.as_ref()?;
        Some(self.output.clone().unwrap_or_else(|| {
            let parent = input.parent().unwrap_or_else(|| Path::new("."));
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            parent.join(format!("{}_analysis.json", stem))
        }))
    }

    /// Load the configuration file (or the preset) and apply command-line overrides
    pub fn resolve_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::legacy_listing(),
        };

        if let Some(encoding) = &self.encoding {
            config.input.encoding = encoding.clone();
        }
        if let Some(separator) = self.separator {
            config.input.separator = separator;
        }
        if let Some(length) = self.infer_schema_length {
            config.input.infer_schema_length = length;
        }
        if let Some(share) = self.min_share {
            match config.aggregation.as_mut() {
                Some(aggregation) => aggregation.min_share = share,
                None => tracing::warn!("--min-share ignored: configuration has no aggregation"),
            }
        }
        if let Some(regression) = config.regression.as_mut() {
            if let Some(ratio) = self.test_ratio {
                regression.split.test_ratio = ratio;
            }
            if let Some(seed) = self.seed {
                regression.split.seed = seed;
            }
        } else if self.test_ratio.is_some() || self.seed.is_some() {
            tracing::warn!("--test-ratio/--seed ignored: configuration has no regression");
        }

        config.validate()?;
        Ok(config)
    }
}

/// Validator for min_share parameter
fn validate_min_share(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..1.0).contains(&value) {
        Err(format!(
            "min_share must be at least 0.0 and below 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}

/// Validator for test_ratio parameter
fn validate_test_ratio(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_ratio must be between 0.0 and 1.0 (exclusive), got {}",
            value
        ))
    }
}
