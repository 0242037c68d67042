//! Indicator (dummy) encoding of categorical columns into a numeric matrix

use std::collections::{BTreeSet, HashMap, HashSet};

use faer::Mat;
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::table::{category_labels, is_numeric_dtype, require_column};
use crate::error::{PipelineError, Result};

const STAGE: &str = "encode";

/// How one categorical column was expanded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEncoding {
    pub column: String,
    /// Level represented by all-zero indicators
    pub reference: String,
    /// Levels that received an indicator column, in column order
    pub levels: Vec<String>,
}

/// Numeric feature matrix whose rows line up with the source table
#[derive(Debug, Clone)]
pub struct EncodedFeatureMatrix {
    feature_names: Vec<String>,
    values: Mat<f64>,
    encodings: Vec<CategoryEncoding>,
}

impl EncodedFeatureMatrix {
    /// Build a matrix from already-numeric columns of equal length
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let nrows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, v)) = columns.iter().find(|(_, v)| v.len() != nrows) {
            return Err(PipelineError::InvalidConfig(format!(
                "feature '{}' has {} rows, expected {}",
                name,
                v.len(),
                nrows
            )));
        }

        let mut values = Mat::<f64>::zeros(nrows, columns.len());
        for (j, (_, column)) in columns.iter().enumerate() {
            for (i, &v) in column.iter().enumerate() {
                values[(i, j)] = v;
            }
        }

        Ok(Self {
            feature_names: columns.into_iter().map(|(name, _)| name).collect(),
            values,
            encodings: Vec::new(),
        })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn values(&self) -> &Mat<f64> {
        &self.values
    }

    pub fn encodings(&self) -> &[CategoryEncoding] {
        &self.encodings
    }

    /// Copy out one feature column by name
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.feature_names.iter().position(|n| n == name)?;
        Some((0..self.nrows()).map(|i| self.values[(i, j)]).collect())
    }

    /// Copy out one row
    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.ncols()).map(|j| self.values[(i, j)]).collect()
    }
}

enum Block {
    Passthrough(Vec<f64>),
    Indicators {
        labels: Vec<String>,
        levels: Vec<String>,
    },
}

/// Expand `categorical` columns into k−1 indicator columns each.
///
/// Levels are sorted lexicographically and the first becomes the reference
/// category. Indicators are named `{column}_{level}` and take the place of
/// their source column; an indicator name that collides with another
/// feature is an `InvalidConfig` error. Every other column passes through as `f64` and must
/// be numeric (or boolean) and null-free. Row order is preserved.
pub fn encode_categorical(df: &DataFrame, categorical: &[String]) -> Result<EncodedFeatureMatrix> {
    for name in categorical {
        require_column(df, name, STAGE)?;
    }
    let categorical: HashSet<&str> = categorical.iter().map(String::as_str).collect();

    let mut blocks: Vec<(String, Block)> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();

        if categorical.contains(name.as_str()) {
            let labels = category_labels(column)?;
            let levels: Vec<String> = labels
                .iter()
                .cloned()
                .collect::<BTreeSet<String>>()
                .into_iter()
                .collect();
            blocks.push((name, Block::Indicators { labels, levels }));
            continue;
        }

        if !is_numeric_dtype(column.dtype()) {
            return Err(PipelineError::coercion(
                name,
                format!(
                    "{} feature is neither numeric nor declared categorical",
                    column.dtype()
                ),
            ));
        }
        let cast = column.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = cast.f64()?.iter().collect();
        if values.iter().any(Option::is_none) {
            return Err(PipelineError::coercion(
                name,
                "feature contains null values",
            ));
        }
        blocks.push((name, Block::Passthrough(values.into_iter().flatten().collect())));
    }

    let mut feature_names = Vec::new();
    let mut encodings = Vec::new();
    for (name, block) in &blocks {
        match block {
            Block::Passthrough(_) => feature_names.push(name.clone()),
            Block::Indicators { levels, .. } => {
                let indicated: Vec<String> = levels.iter().skip(1).cloned().collect();
                feature_names.extend(indicated.iter().map(|level| format!("{}_{}", name, level)));
                encodings.push(CategoryEncoding {
                    column: name.clone(),
                    reference: levels.first().cloned().unwrap_or_default(),
                    levels: indicated,
                });
            }
        }
    }

    let mut seen = HashSet::with_capacity(feature_names.len());
    if let Some(duplicate) = feature_names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(PipelineError::InvalidConfig(format!(
            "encoded feature name '{}' is produced more than once",
            duplicate
        )));
    }

    let nrows = df.height();
    let mut values = Mat::<f64>::zeros(nrows, feature_names.len());
    let mut offset = 0;
    for (_, block) in &blocks {
        match block {
            Block::Passthrough(column) => {
                for (i, &v) in column.iter().enumerate() {
                    values[(i, offset)] = v;
                }
                offset += 1;
            }
            Block::Indicators { labels, levels } => {
                let position: HashMap<&str, usize> = levels
                    .iter()
                    .enumerate()
                    .map(|(idx, level)| (level.as_str(), idx))
                    .collect();
                for (i, label) in labels.iter().enumerate() {
                    // Level 0 is the reference and has no column
                    let idx = position[label.as_str()];
                    if idx > 0 {
                        values[(i, offset + idx - 1)] = 1.0;
                    }
                }
                offset += levels.len().saturating_sub(1);
            }
        }
    }

    debug!(
        rows = nrows,
        features = feature_names.len(),
        categorical = encodings.len(),
        "encoded feature matrix"
    );

    Ok(EncodedFeatureMatrix {
        feature_names,
        values,
        encodings,
    })
}
