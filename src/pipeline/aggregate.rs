//! Grouped aggregation of a numeric column over a categorical key

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::table::{category_labels, dense_values, require_column};
use crate::error::{PipelineError, Result};

const STAGE: &str = "aggregate";

/// Ordering of groups in an [`AggregateResult`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// Order of first appearance of each key in the table
    #[default]
    FirstSeen,
    MeanDescending,
    MeanAscending,
    CountDescending,
}

/// What to aggregate and which groups to keep
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    /// Categorical column that partitions the rows
    pub key: String,
    /// Numeric column summarised per group
    pub value: String,
    /// Groups must hold strictly more than this share of all rows
    pub min_share: f64,
    pub order: GroupOrder,
}

impl GroupSpec {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            min_share: 0.0,
            order: GroupOrder::FirstSeen,
        }
    }

    pub fn with_min_share(mut self, min_share: f64) -> Self {
        self.min_share = min_share;
        self
    }

    pub fn with_order(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }
}

/// Statistics for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    pub count: usize,
    pub mean: f64,
    /// `count` divided by the row count of the whole table
    pub share: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-group statistics of one value column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub key_column: String,
    pub value_column: String,
    pub total_rows: usize,
    pub groups: Vec<GroupStats>,
}

impl AggregateResult {
    pub fn get(&self, key: &str) -> Option<&GroupStats> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn finish(self, key: String, total_rows: usize) -> GroupStats {
        GroupStats {
            key,
            count: self.count,
            mean: self.sum / self.count as f64,
            share: self.count as f64 / total_rows as f64,
            min: self.min,
            max: self.max,
        }
    }
}

/// Partition rows by `spec.key` and summarise `spec.value` per group.
///
/// Shares are computed against the full table before the `min_share`
/// filter is applied. Null keys form their own group under the missing
/// label, so membership stays exhaustive.
pub fn aggregate_by_group(df: &DataFrame, spec: &GroupSpec) -> Result<AggregateResult> {
    check_min_share(spec.min_share)?;

    let labels = category_labels(require_column(df, &spec.key, STAGE)?)?;
    let values = dense_values(df, &spec.value, STAGE)?;
    let total_rows = labels.len();
    if total_rows == 0 {
        return Err(PipelineError::insufficient("aggregation", "table has no rows"));
    }

    let mut order: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut accumulators: Vec<Accumulator> = Vec::new();

    for (label, &value) in labels.iter().zip(values.iter()) {
        let slot = match index.get(label) {
            Some(&slot) => slot,
            None => {
                index.insert(label.clone(), accumulators.len());
                order.push(label.clone());
                accumulators.push(Accumulator::new());
                accumulators.len() - 1
            }
        };
        accumulators[slot].push(value);
    }

    let mut groups: Vec<GroupStats> = order
        .into_iter()
        .zip(accumulators)
        .map(|(key, acc)| acc.finish(key, total_rows))
        .filter(|g| g.share > spec.min_share)
        .collect();
    sort_groups(&mut groups, spec.order);

    debug!(
        key = spec.key.as_str(),
        value = spec.value.as_str(),
        distinct = index.len(),
        kept = groups.len(),
        "aggregated groups"
    );

    Ok(AggregateResult {
        key_column: spec.key.clone(),
        value_column: spec.value.clone(),
        total_rows,
        groups,
    })
}

/// Keys holding strictly more than `min_share` of all rows, in first-seen order
pub fn top_groups(df: &DataFrame, key: &str, min_share: f64) -> Result<Vec<String>> {
    check_min_share(min_share)?;

    let labels = category_labels(require_column(df, key, STAGE)?)?;
    let total_rows = labels.len();
    if total_rows == 0 {
        return Ok(Vec::new());
    }

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in &labels {
        let count = counts.entry(label.as_str()).or_insert(0);
        if *count == 0 {
            order.push(label.as_str());
        }
        *count += 1;
    }

    Ok(order
        .into_iter()
        .filter(|k| counts[k] as f64 / total_rows as f64 > min_share)
        .map(|k| k.to_string())
        .collect())
}

fn sort_groups(groups: &mut [GroupStats], order: GroupOrder) {
    use std::cmp::Ordering;

    // Stable sorts: ties keep first-seen order
    match order {
        GroupOrder::FirstSeen => {}
        GroupOrder::MeanDescending => {
            groups.sort_by(|a, b| b.mean.partial_cmp(&a.mean).unwrap_or(Ordering::Equal))
        }
        GroupOrder::MeanAscending => {
            groups.sort_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap_or(Ordering::Equal))
        }
        GroupOrder::CountDescending => groups.sort_by(|a, b| b.count.cmp(&a.count)),
    }
}

fn check_min_share(min_share: f64) -> Result<()> {
    if !(0.0..1.0).contains(&min_share) {
        return Err(PipelineError::InvalidConfig(format!(
            "group share threshold must be in [0, 1), got {}",
            min_share
        )));
    }
    Ok(())
}
