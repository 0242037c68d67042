//! Write the built-in listing preset as an editable JSON configuration

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;

use crate::config::AnalysisConfig;

const DEFAULT_CONFIG_FILE: &str = "autolens.json";

/// Write the preset to `output` (or `autolens.json`) and return the path written
pub fn run_init_config(output: Option<&Path>) -> Result<PathBuf> {
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let config = AnalysisConfig::legacy_listing();
    config.to_json_file(&output_path)?;

    println!();
    println!(
        " {} Wrote listing preset",
        style("◆").cyan().bold()
    );
    println!("   Output:  {}", style(output_path.display()).dim());
    println!(
        "   Columns: {}",
        style(config.schema.fields().len()).yellow()
    );
    println!();
    println!(
        " {} Edit the file and pass it with --config",
        style("✓").green().bold()
    );

    Ok(output_path)
}
