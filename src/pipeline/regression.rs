//! Train/test evaluation of an ordinary least-squares model
//!
//! Rows are split by a seeded permutation, the model is fit on the
//! training partition with a column-pivoted QR factorization, and error
//! metrics are reported on the held-out partition.

use faer::prelude::SpSolverLstsq;
use faer::Mat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::encoder::EncodedFeatureMatrix;
use crate::error::{PipelineError, Result};

/// Diagonal of R, relative to its largest entry, below which the
/// standardized design is treated as rank-deficient
const RANK_TOLERANCE: f64 = 1e-9;

/// Train/test split parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation, in (0, 1)
    pub test_ratio: f64,
    /// Seed for the row permutation; equal seeds give equal splits
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        Ok(())
    }
}

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Error metrics over one partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub feature: String,
    pub value: f64,
}

/// Fitted coefficients plus evaluation results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelArtifact {
    pub intercept: f64,
    pub coefficients: Vec<Coefficient>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub test_ratio: f64,
    pub seed: u64,
    /// Metrics on the held-out partition
    pub test_metrics: RegressionMetrics,
    /// Metrics on the training partition
    pub train_metrics: RegressionMetrics,
}

impl ModelArtifact {
    /// Predict one row given feature values in coefficient order
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(c, x)| c.value * x)
                .sum::<f64>()
    }
}

/// Permute `0..n` with a seeded RNG and hold out `ceil(n * test_ratio)` rows
pub fn split_indices(n: usize, config: &SplitConfig) -> Result<TrainTestSplit> {
    config.validate()?;

    // Guard against 0.3 * 10 = 3.0000000000000004 rounding up
    let n_test = ((n as f64 * config.test_ratio) - 1e-9).ceil().max(0.0) as usize;
    let n_test = n_test.min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    let test = indices;

    if train.is_empty() {
        return Err(PipelineError::DegenerateInput(format!(
            "training partition is empty ({} rows, test ratio {})",
            n, config.test_ratio
        )));
    }
    if test.is_empty() {
        return Err(PipelineError::DegenerateInput(format!(
            "evaluation partition is empty ({} rows, test ratio {})",
            n, config.test_ratio
        )));
    }

    Ok(TrainTestSplit { train, test })
}

/// Split, fit and evaluate a linear model of `target` on `features`.
pub fn evaluate_regression(
    features: &EncodedFeatureMatrix,
    target: &[f64],
    config: &SplitConfig,
) -> Result<ModelArtifact> {
    if features.nrows() != target.len() {
        return Err(PipelineError::DegenerateInput(format!(
            "feature matrix has {} rows but target has {}",
            features.nrows(),
            target.len()
        )));
    }
    if target.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::DegenerateInput(
            "target contains non-finite values".to_string(),
        ));
    }

    let split = split_indices(target.len(), config)?;
    let x = features.values();
    let (intercept, betas) = fit_least_squares(x, target, &split.train, features.feature_names())?;

    let mut model = ModelArtifact {
        intercept,
        coefficients: features
            .feature_names()
            .iter()
            .zip(betas)
            .map(|(feature, value)| Coefficient {
                feature: feature.clone(),
                value,
            })
            .collect(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        test_ratio: config.test_ratio,
        seed: config.seed,
        test_metrics: RegressionMetrics::default(),
        train_metrics: RegressionMetrics::default(),
    };

    let score = |rows: &[usize]| {
        let actual: Vec<f64> = rows.iter().map(|&i| target[i]).collect();
        let predicted: Vec<f64> = rows.iter().map(|&i| model.predict(&features.row(i))).collect();
        regression_metrics(&actual, &predicted)
    };
    let test_metrics = score(&split.test);
    let train_metrics = score(&split.train);
    model.test_metrics = test_metrics;
    model.train_metrics = train_metrics;

    debug!(
        train_rows = model.train_rows,
        test_rows = model.test_rows,
        features = model.coefficients.len(),
        mse = test_metrics.mse,
        r2 = test_metrics.r2,
        "evaluated regression"
    );

    Ok(model)
}

/// Fit intercept and coefficients on the given rows.
///
/// Columns are centered and scaled on the training rows, the standardized
/// design is factored with a column-pivoted QR, and coefficients are mapped
/// back to the original scale. A column that is constant on these rows, or
/// a vanishing diagonal of R, means no unique solution exists.
pub fn fit_least_squares(
    x: &Mat<f64>,
    y: &[f64],
    rows: &[usize],
    names: &[String],
) -> Result<(f64, Vec<f64>)> {
    let m = rows.len();
    let p = x.ncols();
    if m == 0 {
        return Err(PipelineError::DegenerateInput(
            "training partition is empty".to_string(),
        ));
    }

    let y_mean = rows.iter().map(|&i| y[i]).sum::<f64>() / m as f64;
    if p == 0 {
        return Ok((y_mean, Vec::new()));
    }

    let mut means = vec![0.0; p];
    let mut scales = vec![0.0; p];
    for j in 0..p {
        let mean = rows.iter().map(|&i| x[(i, j)]).sum::<f64>() / m as f64;
        let var = rows
            .iter()
            .map(|&i| (x[(i, j)] - mean) * (x[(i, j)] - mean))
            .sum::<f64>()
            / m as f64;
        let scale = var.sqrt();
        if scale <= f64::EPSILON * (1.0 + mean.abs()) {
            let name = names.get(j).map(String::as_str).unwrap_or("?");
            return Err(PipelineError::DegenerateInput(format!(
                "feature '{}' is constant on the training partition; no unique least-squares solution",
                name
            )));
        }
        means[j] = mean;
        scales[j] = scale;
    }

    let mut z = Mat::<f64>::zeros(m, p);
    for (r, &i) in rows.iter().enumerate() {
        for j in 0..p {
            z[(r, j)] = (x[(i, j)] - means[j]) / scales[j];
        }
    }

    let rank_deficient = || {
        PipelineError::DegenerateInput(
            "feature matrix is rank-deficient; no unique least-squares solution".to_string(),
        )
    };
    if m < p {
        return Err(rank_deficient());
    }

    let qr = z.col_piv_qr();
    let r = qr.compute_thin_r();
    // Column pivoting sorts the diagonal of R by decreasing magnitude
    let largest = r[(0, 0)].abs();
    if (0..p).any(|k| !(r[(k, k)].abs() > RANK_TOLERANCE * largest)) {
        return Err(rank_deficient());
    }

    let centered = Mat::<f64>::from_fn(m, 1, |k, _| y[rows[k]] - y_mean);
    let solution = qr.solve_lstsq(&centered);
    let scaled: Vec<f64> = (0..p).map(|j| solution[(j, 0)]).collect();

    let betas: Vec<f64> = scaled.iter().zip(scales.iter()).map(|(b, s)| b / s).collect();
    let intercept = y_mean - betas.iter().zip(means.iter()).map(|(b, m)| b * m).sum::<f64>();
    Ok((intercept, betas))
}

/// Mean squared error, its root and the coefficient of determination.
///
/// When the actual values have zero variance R² is 1.0 for an exact fit and
/// 0.0 otherwise.
pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> RegressionMetrics {
    let n = actual.len().max(1) as f64;
    let mean = actual.iter().sum::<f64>() / n;

    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (p - a) * (p - a))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();

    let mse = ss_res / n;
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    RegressionMetrics {
        mse,
        rmse: mse.sqrt(),
        r2,
    }
}
