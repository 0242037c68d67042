//! Tests for indicator encoding of categorical columns

#[path = "common/mod.rs"]
mod common;

use autolens::pipeline::{encode_categorical, EncodedFeatureMatrix};
use autolens::PipelineError;
use common::*;
use polars::prelude::*;

fn mixed_frame() -> DataFrame {
    df! {
        "year" => [2005i64, 2010, 2001, 2012, 2008],
        "fuel" => ["diesel", "benzin", "lpg", "benzin", "diesel"],
        "power" => [75.0f64, 110.0, 60.0, 150.0, 90.0],
    }
    .unwrap()
}

#[test]
fn test_k_minus_one_indicators_in_place() {
    let df = mixed_frame();
    let matrix = encode_categorical(&df, &["fuel".to_string()]).unwrap();

    // benzin is the lexicographically first level and becomes the reference
    assert_eq!(
        matrix.feature_names(),
        &["year", "fuel_diesel", "fuel_lpg", "power"]
    );
    assert_eq!(matrix.nrows(), df.height());
    assert_eq!(matrix.ncols(), 4);

    let encoding = &matrix.encodings()[0];
    assert_eq!(encoding.column, "fuel");
    assert_eq!(encoding.reference, "benzin");
    assert_eq!(encoding.levels, vec!["diesel", "lpg"]);
}

#[test]
fn test_rows_keep_their_order() {
    let df = mixed_frame();
    let matrix = encode_categorical(&df, &["fuel".to_string()]).unwrap();

    assert_eq!(matrix.column("year").unwrap(), vec![2005.0, 2010.0, 2001.0, 2012.0, 2008.0]);
    assert_eq!(matrix.column("fuel_diesel").unwrap(), vec![1.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(matrix.column("fuel_lpg").unwrap(), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
    assert_eq!(matrix.row(2), vec![2001.0, 0.0, 1.0, 60.0]);
}

#[test]
fn test_indicators_sum_to_at_most_one() {
    let df = create_listing_dataframe(30);
    let features = df.select(["brand", "fuelType", "gearbox"]).unwrap();
    let categorical: Vec<String> = ["brand", "fuelType", "gearbox"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let matrix = encode_categorical(&features, &categorical).unwrap();

    // 3 brands + 2 fuels + 2 gearboxes → 2 + 1 + 1 indicators
    assert_eq!(matrix.ncols(), 4);
    assert_eq!(matrix.nrows(), 30);

    for encoding in matrix.encodings() {
        let columns: Vec<Vec<f64>> = encoding
            .levels
            .iter()
            .map(|level| matrix.column(&format!("{}_{}", encoding.column, level)).unwrap())
            .collect();
        for i in 0..matrix.nrows() {
            let sum: f64 = columns.iter().map(|c| c[i]).sum();
            assert!(sum == 0.0 || sum == 1.0);
        }
    }
}

#[test]
fn test_single_level_column_yields_no_indicators() {
    let df = df! {
        "x" => [1.0f64, 2.0, 3.0],
        "kind" => ["only", "only", "only"],
    }
    .unwrap();
    let matrix = encode_categorical(&df, &["kind".to_string()]).unwrap();
    assert_eq!(matrix.feature_names(), &["x"]);
    assert_eq!(matrix.encodings()[0].reference, "only");
    assert!(matrix.encodings()[0].levels.is_empty());
}

#[test]
fn test_null_categories_become_a_level() {
    let df = df! { "damage" => [Some("ja"), None, Some("nein")] }.unwrap();
    let matrix = encode_categorical(&df, &["damage".to_string()]).unwrap();
    assert_eq!(matrix.feature_names(), &["damage_nein", "damage_unknown"]);
    assert_eq!(matrix.row(1), vec![0.0, 1.0]);
}

#[test]
fn test_undeclared_text_column_is_rejected() {
    let df = mixed_frame();
    let err = encode_categorical(&df, &[]).unwrap_err();
    assert!(matches!(err, PipelineError::Coercion { ref column, .. } if column == "fuel"));
}

#[test]
fn test_null_numeric_feature_is_rejected() {
    let df = df! { "x" => [Some(1.0f64), None] }.unwrap();
    assert!(matches!(
        encode_categorical(&df, &[]),
        Err(PipelineError::Coercion { .. })
    ));
}

#[test]
fn test_missing_categorical_column_is_schema_error() {
    let df = mixed_frame();
    let err = encode_categorical(&df, &["gearbox".to_string()]).unwrap_err();
    assert!(matches!(err, PipelineError::Schema { stage: "encode", .. }));
}

#[test]
fn test_indicator_colliding_with_numeric_column_is_rejected() {
    let df = df! {
        "fuel" => ["diesel", "type", "diesel"],
        "fuel_type" => [1.0f64, 2.0, 3.0],
    }
    .unwrap();

    let err = encode_categorical(&df, &["fuel".to_string()]).unwrap_err();
    match err {
        PipelineError::InvalidConfig(message) => assert!(message.contains("fuel_type")),
        other => panic!("expected InvalidConfig, got {:?}", other),
    }
}

#[test]
fn test_from_columns_checks_lengths() {
    let ok = EncodedFeatureMatrix::from_columns(vec![
        ("a".to_string(), vec![1.0, 2.0]),
        ("b".to_string(), vec![3.0, 4.0]),
    ])
    .unwrap();
    assert_eq!(ok.row(1), vec![2.0, 4.0]);

    assert!(EncodedFeatureMatrix::from_columns(vec![
        ("a".to_string(), vec![1.0, 2.0]),
        ("b".to_string(), vec![3.0]),
    ])
    .is_err());
}
