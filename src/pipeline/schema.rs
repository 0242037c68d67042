//! Schema normalization: map raw column names onto a canonical schema

use std::collections::{HashMap, HashSet};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::table::column_names;
use crate::error::{PipelineError, Result};

const STAGE: &str = "normalize";

/// Semantic type of a canonical column. Drives coercion policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticType {
    /// Plain number, possibly written with thousands separators
    Numeric,
    /// Free-form label used for grouping and encoding
    Categorical,
    /// Timestamp or date; `format` is a chrono format string
    Temporal {
        #[serde(default)]
        format: Option<String>,
    },
    /// Money amount decorated with a currency symbol, e.g. `$1,000`
    Currency { symbol: String },
    /// Distance decorated with a unit suffix, e.g. `10,000km`
    Distance { unit: String },
}

impl SemanticType {
    /// Whether the column holds numbers once coerced
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Numeric | SemanticType::Currency { .. } | SemanticType::Distance { .. }
        )
    }
}

/// One raw → canonical column mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name as it appears in the raw file
    pub raw: String,
    /// Name the column carries through the rest of the pipeline
    pub canonical: String,
    #[serde(rename = "type")]
    pub kind: SemanticType,
}

impl FieldSpec {
    pub fn new(raw: impl Into<String>, canonical: impl Into<String>, kind: SemanticType) -> Self {
        Self {
            raw: raw.into(),
            canonical: canonical.into(),
            kind,
        }
    }

    /// Mapping whose canonical name is the snake_case form of the raw name
    pub fn snake_case(raw: impl Into<String>, kind: SemanticType) -> Self {
        let raw = raw.into();
        let canonical = to_snake_case(&raw);
        Self::new(raw, canonical, kind)
    }
}

/// Ordered canonical schema consulted by every stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Canonical column names in schema order
    pub fn canonical_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.canonical.clone()).collect()
    }

    /// Look up a field by canonical name
    pub fn get(&self, canonical: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.canonical == canonical)
    }

    /// Reject empty schemas and duplicate canonical names
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "schema mapping is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.canonical.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "raw column '{}' maps to an empty canonical name",
                    field.raw
                )));
            }
            if !seen.insert(field.canonical.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "canonical column '{}' is mapped more than once",
                    field.canonical
                )));
            }
        }
        Ok(())
    }
}

/// Rename and select raw columns into the canonical schema.
///
/// Raw names are matched exactly first, then by a normalized key that
/// ignores case, spaces and punctuation, so `yearOfRegistration` and
/// `Year Of Registration` resolve to the same column. Columns the schema
/// does not mention are dropped; row count and order are preserved.
pub fn normalize_schema(df: &DataFrame, schema: &Schema) -> Result<DataFrame> {
    schema.validate()?;

    let available = column_names(df);
    let mut by_key: HashMap<String, &str> = HashMap::new();
    for name in &available {
        by_key.entry(normalized_key(name)).or_insert(name.as_str());
    }

    let mut columns: Vec<Column> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let raw = if available.iter().any(|n| n == &field.raw) {
            field.raw.as_str()
        } else {
            by_key
                .get(&normalized_key(&field.raw))
                .copied()
                .ok_or_else(|| PipelineError::Schema {
                    stage: STAGE,
                    column: field.raw.clone(),
                    available: available.clone(),
                })?
        };

        let series = df
            .column(raw)?
            .as_materialized_series()
            .clone()
            .with_name(field.canonical.as_str().into());
        columns.push(Column::from(series));
    }

    let normalized = DataFrame::new(columns)?;
    debug!(
        rows = normalized.height(),
        kept = normalized.width(),
        dropped = df.width().saturating_sub(normalized.width()),
        "normalized schema"
    );
    Ok(normalized)
}

/// Convert camelCase, PascalCase or spaced names to snake_case.
///
/// `yearOfRegistration` → `year_of_registration`, `powerPS` → `power_ps`,
/// `Fuel Type` → `fuel_type`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() || c == '-' || c == '.' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out.trim_end_matches('_').to_string()
}

fn normalized_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
