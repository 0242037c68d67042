//! Benchmark indicator encoding and the train/test regression fit
//!
//! Run with: cargo bench --bench regression_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use autolens::pipeline::{encode_categorical, evaluate_regression, SplitConfig};

/// Numeric features plus one categorical column with `n_levels` levels
fn generate_feature_frame(n_rows: usize, n_numeric: usize, n_levels: usize, seed: u64) -> (DataFrame, Vec<f64>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let mut columns: Vec<Column> = Vec::with_capacity(n_numeric + 1);
    let mut target = vec![0.0; n_rows];

    for j in 0..n_numeric {
        let weight = (j + 1) as f64;
        let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 100.0).collect();
        for (t, v) in target.iter_mut().zip(values.iter()) {
            *t += weight * v;
        }
        columns.push(Column::new(format!("x_{}", j).into(), values));
    }

    let levels: Vec<String> = (0..n_rows)
        .map(|i| format!("level_{:04}", (i + rng.gen_range(0..n_levels)) % n_levels))
        .collect();
    for (t, level) in target.iter_mut().zip(levels.iter()) {
        *t += level.len() as f64 + rng.gen::<f64>() * 5.0;
    }
    columns.push(Column::new("category".into(), levels));

    (
        DataFrame::new(columns).expect("Failed to create DataFrame"),
        target,
    )
}

fn benchmark_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_categorical");
    group.sample_size(20);

    let n_rows = 50_000;
    for n_levels in [3, 30, 300] {
        let (df, _) = generate_feature_frame(n_rows, 3, n_levels, 42);
        let categorical = vec!["category".to_string()];
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n_levels), &df, |b, df| {
            b.iter(|| {
                let _ = encode_categorical(black_box(df), black_box(&categorical));
            });
        });
    }

    group.finish();
}

fn benchmark_regression(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_regression");
    group.sample_size(20);

    let config = SplitConfig::default();
    for (n_rows, n_numeric, n_levels) in [(10_000, 3, 10), (50_000, 3, 10), (50_000, 10, 40)] {
        let (df, target) = generate_feature_frame(n_rows, n_numeric, n_levels, 42);
        let matrix = encode_categorical(&df, &["category".to_string()])
            .expect("Failed to encode features");
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(
            BenchmarkId::new(format!("{}_features", matrix.ncols()), n_rows),
            &(&matrix, &target),
            |b, (matrix, target)| {
                b.iter(|| {
                    let _ = evaluate_regression(black_box(*matrix), black_box(*target), black_box(&config));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_encoding, benchmark_regression);
criterion_main!(benches);
