//! Tests for schema normalization

#[path = "common/mod.rs"]
mod common;

use autolens::pipeline::{
    column_names, normalize_schema, to_snake_case, FieldSpec, Schema, SemanticType,
};
use autolens::{AnalysisConfig, PipelineError};
use common::*;
use polars::prelude::*;

#[test]
fn test_normalize_matches_case_and_spacing() {
    let df = create_decorated_dataframe();
    let normalized = normalize_schema(&df, &decorated_schema()).unwrap();

    assert_eq!(
        column_names(&normalized),
        vec!["price", "odometer_km", "registration_year", "brand"]
    );
    assert_eq!(normalized.height(), df.height());
}

#[test]
fn test_normalize_preserves_row_order() {
    let df = create_decorated_dataframe();
    let normalized = normalize_schema(&df, &decorated_schema()).unwrap();
    assert_eq!(str_column(&normalized, "brand"), vec!["A", "B"]);
    assert_eq!(str_column(&normalized, "price"), vec!["$1,000", "$2,000"]);
}

#[test]
fn test_normalize_drops_unmapped_columns() {
    let df = create_listing_dataframe(6);
    let config = AnalysisConfig::legacy_listing();
    let normalized = normalize_schema(&df, &config.schema).unwrap();

    assert_eq!(column_names(&normalized), config.schema.canonical_names());
    assert!(normalized.column("seller").is_err());
    assert!(normalized.column("nr_of_pictures").is_err());
    assert_eq!(normalized.height(), 6);

    // The input is left untouched
    assert_eq!(df.width(), 20);
}

#[test]
fn test_normalize_missing_column_names_stage_and_column() {
    let df = df! { "price" => ["$1"] }.unwrap();
    let err = normalize_schema(&df, &decorated_schema()).unwrap_err();

    match &err {
        PipelineError::Schema {
            stage,
            column,
            available,
        } => {
            assert_eq!(*stage, "normalize");
            assert_eq!(column, "odometer");
            assert_eq!(available, &vec!["price".to_string()]);
        }
        other => panic!("expected schema error, got {:?}", other),
    }
    assert!(err.to_string().contains("odometer"));
}

#[test]
fn test_exact_match_wins_over_normalized_key() {
    let df = df! {
        "Brand" => ["upper"],
        "brand" => ["lower"],
    }
    .unwrap();
    let schema = Schema::new(vec![FieldSpec::new("brand", "make", SemanticType::Categorical)]);

    let normalized = normalize_schema(&df, &schema).unwrap();
    assert_eq!(str_column(&normalized, "make"), vec!["lower"]);
}

#[test]
fn test_duplicate_canonical_names_are_rejected() {
    let df = create_decorated_dataframe();
    let schema = Schema::new(vec![
        FieldSpec::new("price", "value", SemanticType::Numeric),
        FieldSpec::new("odometer", "value", SemanticType::Numeric),
    ]);
    assert!(matches!(
        normalize_schema(&df, &schema),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn test_legacy_header_maps_to_snake_case() {
    assert_eq!(to_snake_case("dateCrawled"), "date_crawled");
    assert_eq!(to_snake_case("vehicleType"), "vehicle_type");
    assert_eq!(to_snake_case("fuelType"), "fuel_type");
    assert_eq!(to_snake_case("postalCode"), "postal_code");

    let config = AnalysisConfig::legacy_listing();
    for name in [
        "date_crawled",
        "registration_year",
        "power_ps",
        "odometer_km",
        "registration_month",
        "unrepaired_damage",
        "ad_created",
        "last_seen",
    ] {
        assert!(config.schema.get(name).is_some(), "missing {}", name);
    }
}
