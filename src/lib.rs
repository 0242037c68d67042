//! autolens: cleaning and analysis of tabular listing exports
//!
//! A raw delimited export is normalized to canonical column names, coerced
//! to typed columns and range-filtered. The cleaned table then feeds two
//! independent branches: grouped aggregation with a correlation of group
//! means, and a train/test evaluation of a linear model over indicator
//! encoded features.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use config::AnalysisConfig;
pub use error::{PipelineError, Result};
