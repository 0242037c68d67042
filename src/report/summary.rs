//! Terminal summary of an analysis run

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{AggregateResult, AnalysisOutcome, ColumnDrops, ColumnShares, ModelArtifact};

/// Most frequent values listed per column in the terminal summary
const SHARES_SHOWN: usize = 5;

/// Row counts through the cleaning stages
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleaningSummary {
    pub loaded_rows: usize,
    pub dropped_coercion: usize,
    pub dropped_ranges: usize,
    pub final_rows: usize,
    pub coercion_failures: Vec<ColumnDrops>,
    pub range_violations: Vec<ColumnDrops>,
}

impl CleaningSummary {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        let cleaned = &outcome.cleaned;
        Self {
            loaded_rows: cleaned.loaded_rows,
            dropped_coercion: cleaned.coercion.dropped_rows,
            dropped_ranges: cleaned.filter.dropped_rows,
            final_rows: cleaned.table.height(),
            coercion_failures: cleaned.coercion.failures.clone(),
            range_violations: cleaned.filter.violations.clone(),
        }
    }

    /// Share of loaded rows that survived cleaning, in percent
    pub fn retained_pct(&self) -> f64 {
        if self.loaded_rows == 0 {
            0.0
        } else {
            self.final_rows as f64 / self.loaded_rows as f64 * 100.0
        }
    }

    pub fn display(&self) {
        print_section("📋", "CLEANING SUMMARY");

        let mut table = new_table(&["Metric", "Rows"]);
        table.add_row(vec![Cell::new("📁 Loaded"), Cell::new(self.loaded_rows)]);
        table.add_row(vec![
            Cell::new("🧹 Dropped (Coercion)"),
            count_cell(self.dropped_coercion),
        ]);
        table.add_row(vec![
            Cell::new("📏 Dropped (Ranges)"),
            count_cell(self.dropped_ranges),
        ]);
        table.add_row(vec![
            Cell::new("✅ Final"),
            Cell::new(self.final_rows)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        let retained = self.retained_pct();
        let color = if retained > 70.0 {
            Color::Green
        } else if retained > 40.0 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("📈 Retained"),
            Cell::new(format!("{:.1}%", retained))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);
        print_indented(&table);

        print_drops("Unparseable Values", &self.coercion_failures);
        print_drops("Out of Range", &self.range_violations);
    }
}

/// Print one aggregate as a group table
pub fn display_aggregate(result: &AggregateResult) {
    print_section(
        "📊",
        &format!(
            "{} BY {}",
            result.value_column.to_uppercase(),
            result.key_column.to_uppercase()
        ),
    );

    let mut table = new_table(&["Group", "Count", "Share", "Mean", "Min", "Max"]);
    for group in &result.groups {
        table.add_row(vec![
            Cell::new(&group.key),
            Cell::new(group.count),
            Cell::new(format!("{:.1}%", group.share * 100.0)),
            Cell::new(format!("{:.2}", group.mean)).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.2}", group.min)),
            Cell::new(format!("{:.2}", group.max)),
        ]);
    }
    print_indented(&table);
}

/// Print the most frequent values of one column
pub fn display_shares(shares: &ColumnShares) {
    print_section("🔢", &format!("{} FREQUENCIES", shares.column.to_uppercase()));

    let mut table = new_table(&["Value", "Count", "Share"]);
    for value in shares.values.iter().take(SHARES_SHOWN) {
        table.add_row(vec![
            Cell::new(&value.value),
            Cell::new(value.count),
            Cell::new(format!("{:.1}%", value.share * 100.0)),
        ]);
    }
    print_indented(&table);
    if shares.values.len() > SHARES_SHOWN {
        println!(
            "    {}",
            style(format!("... {} more values", shares.values.len() - SHARES_SHOWN)).dim()
        );
    }
}

/// Print the fitted model and its metrics
pub fn display_model(model: &ModelArtifact) {
    print_section("🤖", "REGRESSION MODEL");

    let mut table = new_table(&["Metric", "Train", "Test"]);
    table.add_row(vec![
        Cell::new("Rows"),
        Cell::new(model.train_rows),
        Cell::new(model.test_rows),
    ]);
    table.add_row(vec![
        Cell::new("MSE"),
        Cell::new(format!("{:.4}", model.train_metrics.mse)),
        Cell::new(format!("{:.4}", model.test_metrics.mse)),
    ]);
    table.add_row(vec![
        Cell::new("RMSE"),
        Cell::new(format!("{:.4}", model.train_metrics.rmse)),
        Cell::new(format!("{:.4}", model.test_metrics.rmse)),
    ]);
    let r2_color = if model.test_metrics.r2 > 0.5 {
        Color::Green
    } else if model.test_metrics.r2 > 0.0 {
        Color::Yellow
    } else {
        Color::Red
    };
    table.add_row(vec![
        Cell::new("R²"),
        Cell::new(format!("{:.4}", model.train_metrics.r2)),
        Cell::new(format!("{:.4}", model.test_metrics.r2))
            .fg(r2_color)
            .add_attribute(Attribute::Bold),
    ]);
    print_indented(&table);
}

/// Print everything a run produced
pub fn display_outcome(outcome: &AnalysisOutcome) {
    CleaningSummary::from_outcome(outcome).display();

    if let Some(aggregation) = &outcome.aggregation {
        for result in &aggregation.aggregates {
            display_aggregate(result);
        }
        if let Some(correlation) = &aggregation.correlation {
            println!();
            println!(
                "    {} Correlation of {} and {} group means: {}",
                style("🔗").cyan(),
                correlation.left_column,
                correlation.right_column,
                style(format!("{:.4}", correlation.coefficient)).yellow().bold()
            );
        }
        for shares in &aggregation.shares {
            display_shares(shares);
        }
    }

    if let Some(model) = &outcome.model {
        display_model(model);
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn count_cell(count: usize) -> Cell {
    Cell::new(count).fg(if count == 0 { Color::White } else { Color::Red })
}

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn print_drops(title: &str, drops: &[ColumnDrops]) {
    let drops: Vec<&ColumnDrops> = drops.iter().filter(|d| d.count > 0).collect();
    if drops.is_empty() {
        return;
    }
    println!();
    println!(
        "      {} {}:",
        style(title).yellow(),
        style(format!("({})", drops.len())).dim()
    );
    for drop in drops {
        println!(
            "        {} {} {}",
            style("•").dim(),
            drop.column,
            style(format!("({} rows)", drop.count)).dim()
        );
    }
}
