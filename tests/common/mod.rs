//! Shared test utilities and fixture generators

#![allow(dead_code)]

use autolens::pipeline::{FieldSpec, Schema, SemanticType, ValidityRange};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

/// Raw header of the used-vehicle listing export, in file order
pub const LISTING_HEADER: [&str; 20] = [
    "dateCrawled",
    "name",
    "seller",
    "offerType",
    "price",
    "abtest",
    "vehicleType",
    "yearOfRegistration",
    "gearbox",
    "powerPS",
    "model",
    "odometer",
    "monthOfRegistration",
    "fuelType",
    "brand",
    "notRepairedDamage",
    "dateCreated",
    "nrOfPictures",
    "postalCode",
    "lastSeen",
];

/// Two-row raw table with decorated price and odometer text
///
/// Cleans to price 1000/2000 and odometer_km 10000/20000.
pub fn create_decorated_dataframe() -> DataFrame {
    df! {
        "Price" => ["$1,000", "$2,000"],
        "Odometer" => ["10,000km", "20,000km"],
        "Registration Year" => [2005i64, 2010],
        "Brand" => ["A", "B"],
    }
    .unwrap()
}

/// Schema for [`create_decorated_dataframe`]
pub fn decorated_schema() -> Schema {
    Schema::new(vec![
        FieldSpec::new(
            "price",
            "price",
            SemanticType::Currency {
                symbol: "$".to_string(),
            },
        ),
        FieldSpec::new(
            "odometer",
            "odometer_km",
            SemanticType::Distance {
                unit: "km".to_string(),
            },
        ),
        FieldSpec::new("registration_year", "registration_year", SemanticType::Numeric),
        FieldSpec::new("brand", "brand", SemanticType::Categorical),
    ])
}

/// Price and registration-year bounds of the listing preset
pub fn listing_ranges() -> BTreeMap<String, ValidityRange> {
    let mut ranges = BTreeMap::new();
    ranges.insert(
        "price".to_string(),
        ValidityRange {
            min: 1000.0,
            max: 1_000_000.0,
        },
    );
    ranges.insert(
        "registration_year".to_string(),
        ValidityRange {
            min: 1900.0,
            max: 2016.0,
        },
    );
    ranges
}

/// Cleaned table for aggregation tests
///
/// - `brand`: audi ×4, bmw ×3, fiat ×2, lada ×1 (first-seen order audi, bmw, fiat, lada)
/// - `price`: audi mean 12500, bmw mean 20000, fiat mean 3000, lada 1500
/// - `odometer_km`: decreases with price
pub fn create_brand_dataframe() -> DataFrame {
    df! {
        "brand" => ["audi", "bmw", "audi", "fiat", "bmw", "audi", "lada", "fiat", "bmw", "audi"],
        "price" => [10000.0f64, 18000.0, 15000.0, 2500.0, 20000.0, 12000.0, 1500.0, 3500.0, 22000.0, 13000.0],
        "odometer_km" => [90000.0f64, 40000.0, 80000.0, 150000.0, 35000.0, 95000.0, 150000.0, 140000.0, 30000.0, 85000.0],
    }
    .unwrap()
}

/// Noise-free linear data: y = 3 + 2·x1 − 0.5·x2 + 4·[color = green] + 1·[color = red]
pub fn create_linear_dataframe(rows: usize) -> DataFrame {
    let colors = ["blue", "green", "red"];
    let x1: Vec<f64> = (0..rows).map(|i| (i % 17) as f64).collect();
    let x2: Vec<f64> = (0..rows).map(|i| ((i * 7) % 23) as f64).collect();
    let color: Vec<&str> = (0..rows).map(|i| colors[(i / 2) % 3]).collect();
    let y: Vec<f64> = (0..rows)
        .map(|i| {
            let bump = match color[i] {
                "green" => 4.0,
                "red" => 1.0,
                _ => 0.0,
            };
            3.0 + 2.0 * x1[i] - 0.5 * x2[i] + bump
        })
        .collect();

    DataFrame::new(vec![
        Column::new("x1".into(), x1),
        Column::new("x2".into(), x2),
        Column::new("color".into(), color),
        Column::new("y".into(), y),
    ])
    .unwrap()
}

/// Format an integer with comma thousands separators
pub fn with_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Raw listing export with `rows` rows in the camelCase header layout.
///
/// Every value parses and lies inside the preset ranges, so the whole
/// table survives cleaning. Brands, fuel types and gearboxes cycle so that
/// every level appears many times.
pub fn create_listing_dataframe(rows: usize) -> DataFrame {
    let brands = ["volkswagen", "bmw", "opel"];
    let fuels = ["benzin", "diesel"];
    let gearboxes = ["manuell", "automatik"];

    let year: Vec<i64> = (0..rows).map(|i| 2000 + (i % 15) as i64).collect();
    let power: Vec<i64> = (0..rows).map(|i| 60 + ((i * 7) % 150) as i64).collect();
    let odometer: Vec<i64> = (0..rows).map(|i| 5000 * (1 + ((i * 11) % 30) as i64)).collect();
    let brand: Vec<&str> = (0..rows).map(|i| brands[i % 3]).collect();
    let fuel: Vec<&str> = (0..rows).map(|i| fuels[(i / 3) % 2]).collect();
    let gearbox: Vec<&str> = (0..rows).map(|i| gearboxes[(i / 2) % 2]).collect();
    let price: Vec<i64> = (0..rows)
        .map(|i| {
            let brand_bump = match brand[i] {
                "bmw" => 4000,
                "opel" => -1500,
                _ => 0,
            };
            20000 + 500 * (year[i] - 2000) - odometer[i] / 20 + 30 * power[i] + brand_bump
                + ((i * 37) % 400) as i64
        })
        .collect();

    let price_text: Vec<String> = price.iter().map(|p| format!("${}", with_thousands(*p))).collect();
    let odometer_text: Vec<String> = odometer
        .iter()
        .map(|o| format!("{}km", with_thousands(*o)))
        .collect();
    let crawled: Vec<String> = (0..rows)
        .map(|i| format!("2016-03-{:02} 10:{:02}:00", 5 + i % 20, i % 60))
        .collect();
    let created: Vec<String> = (0..rows)
        .map(|i| format!("2016-03-{:02} 00:00:00", 5 + i % 20))
        .collect();
    let damage: Vec<Option<&str>> = (0..rows)
        .map(|i| match i % 4 {
            0 => None,
            1 => Some("ja"),
            _ => Some("nein"),
        })
        .collect();

    DataFrame::new(vec![
        Column::new("dateCrawled".into(), crawled),
        Column::new(
            "name".into(),
            (0..rows).map(|i| format!("car_{}", i)).collect::<Vec<_>>(),
        ),
        Column::new("seller".into(), vec!["privat"; rows]),
        Column::new("offerType".into(), vec!["Angebot"; rows]),
        Column::new("price".into(), price_text),
        Column::new("abtest".into(), (0..rows).map(|i| if i % 2 == 0 { "test" } else { "control" }).collect::<Vec<_>>()),
        Column::new("vehicleType".into(), vec!["limousine"; rows]),
        Column::new("yearOfRegistration".into(), year),
        Column::new("gearbox".into(), gearbox),
        Column::new("powerPS".into(), power),
        Column::new("model".into(), vec!["golf"; rows]),
        Column::new("odometer".into(), odometer_text),
        Column::new("monthOfRegistration".into(), (0..rows).map(|i| (i % 12) as i64 + 1).collect::<Vec<_>>()),
        Column::new("fuelType".into(), fuel),
        Column::new("brand".into(), brand),
        Column::new("notRepairedDamage".into(), damage),
        Column::new("dateCreated".into(), created),
        Column::new("nrOfPictures".into(), vec![0i64; rows]),
        Column::new("postalCode".into(), (0..rows).map(|i| 10000 + i as i64 * 13).collect::<Vec<_>>()),
        Column::new("lastSeen".into(), vec!["2016-04-07 03:16:57"; rows]),
    ])
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory holding `bytes` under `file_name`
pub fn create_temp_file(file_name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(file_name);
    std::fs::write(&path, bytes).unwrap();
    (temp_dir, path)
}

/// Read a column as `f64` values (nulls panic)
pub fn f64_column(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .iter()
        .map(|v| v.unwrap())
        .collect()
}

/// Read a column as strings (nulls panic)
pub fn str_column(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .iter()
        .map(|v| v.unwrap().to_string())
        .collect()
}

/// Assert two floats are equal within tolerance
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {} ± {}, got {}",
        expected,
        tol,
        actual
    );
}
