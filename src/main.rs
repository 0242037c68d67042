//! autolens: listing cleaning and analysis CLI
//!
//! Loads a raw delimited export, cleans it, runs the grouped aggregation
//! and regression branches, prints a summary and writes a JSON report.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use autolens::cli::{run_init_config, Cli, Commands};
use autolens::pipeline::{clean_table, load_table_with_progress, run_branches, AnalysisOutcome};
use autolens::report::{build_report, display_outcome, write_report};
use autolens::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_success, print_warning,
};

/// Initialize the tracing subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::InitConfig { output } => run_init_config(output.as_deref()).map(|_| ()),
        };
    }

    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;
    let config = cli.resolve_config()?;
    let report_path = cli.report_path();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        input,
        report_path.as_deref(),
        config.aggregation.as_ref().map(|a| a.min_share),
        config.regression.as_ref().map(|r| r.split.test_ratio),
        config.regression.as_ref().map(|r| r.split.seed),
    );

    let start = Instant::now();

    // Step 1: Load dataset
    print_step_header(1, "Loading Dataset");
    let (raw, rows, cols, memory_mb) = load_table_with_progress(input, &config.input)?;
    print_info(&format!(
        "{} rows × {} columns ({:.1} MB in memory)",
        rows, cols, memory_mb
    ));

    // Step 2: Normalize, coerce and range-filter
    print_step_header(2, "Cleaning");
    let spinner = create_spinner("Normalizing schema and coercing fields...");
    let cleaned = match clean_table(&raw, &config) {
        Ok(cleaned) => {
            finish_with_success(&spinner, "Cleaning complete");
            cleaned
        }
        Err(e) => {
            finish_with_warning(&spinner, "Cleaning failed");
            return Err(e.into());
        }
    };
    drop(raw);

    print_count(
        "rows dropped with unparseable values",
        cleaned.coercion.dropped_rows,
        None,
    );
    print_count(
        "rows dropped outside validity ranges",
        cleaned.filter.dropped_rows,
        Some(format!("({} ranges)", config.ranges.len()).as_str()),
    );
    if cleaned.table.height() == 0 {
        print_warning("No rows survived cleaning");
    } else {
        print_success(&format!("{} rows retained", cleaned.table.height()));
    }

    // Step 3: Aggregation and regression branches
    print_step_header(3, "Analysis");
    let spinner = create_spinner("Aggregating groups and evaluating model...");
    let (aggregation, model) = match run_branches(&cleaned.table, &config) {
        Ok(results) => {
            finish_with_success(&spinner, "Analysis complete");
            results
        }
        Err(e) => {
            finish_with_warning(&spinner, "Analysis failed");
            return Err(e.into());
        }
    };

    let outcome = AnalysisOutcome {
        cleaned,
        aggregation,
        model,
    };
    display_outcome(&outcome);

    // Step 4: Report
    if let Some(path) = report_path {
        print_step_header(4, "Writing Report");
        let report = build_report(input, &config, &outcome);
        write_report(&report, &path)?;
        print_success(&format!("Report written to {}", path.display()));
    }

    println!();
    println!(
        "    {} {}",
        style("⏱").dim(),
        style(format!("Finished in {:.2}s", start.elapsed().as_secs_f64())).dim()
    );
    print_completion();

    Ok(())
}
