//! Standardize-then-ridge regression pipeline.
//!
//! The scaler uses population statistics from the training rows only; columns
//! with zero variance are left unscaled. The intercept is not penalized, so
//! with centered inputs it is the training mean of the target. The normal
//! equations are solved by Cholesky factorization.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest Cholesky pivot treated as non-zero
const PIVOT_EPSILON: f64 = 1e-6;

/// Column std below this is treated as constant
const ZERO_VARIANCE: f64 = 1e-12;

/// Per-column mean/scale fitted on training rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = match rows.first() {
            Some(row) => row.len(),
            None => return Err(Error::InsufficientData("no rows to fit scaler".to_string())),
        };
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((var, value), mean) in scales.iter_mut().zip(row).zip(&means) {
                *var += (value - mean).powi(2);
            }
        }
        for scale in &mut scales {
            let std = (*scale / n).sqrt();
            *scale = if std > ZERO_VARIANCE { std } else { 1.0 };
        }

        Ok(Self { means, scales })
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((value, mean), scale)| (value - mean) / scale)
            .collect()
    }
}

/// Fitted scaler plus ridge coefficients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RidgePipeline {
    pub alpha: f64,
    pub scaler: StandardScaler,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RidgePipeline {
    /// Fit on raw (unscaled) rows
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], alpha: f64) -> Result<Self> {
        if rows.len() != targets.len() {
            return Err(Error::InsufficientData(format!(
                "{} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let scaler = StandardScaler::fit(rows)?;
        let width = scaler.means.len();
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();

        let intercept = targets.iter().sum::<f64>() / targets.len() as f64;

        let x = DMatrix::from_fn(rows.len(), width, |i, j| scaled[i][j]);
        let y = DVector::from_iterator(targets.len(), targets.iter().map(|t| t - intercept));

        // Normal equations: (XᵀX + αI) w = Xᵀ(y - ȳ)
        let xt = x.transpose();
        let gram = &xt * &x + DMatrix::<f64>::identity(width, width) * alpha;
        let rhs = &xt * y;

        let cholesky = gram.cholesky().ok_or(Error::SingularSystem)?;
        if cholesky.l_dirty().diagonal().iter().any(|d| d.abs() < PIVOT_EPSILON) {
            return Err(Error::SingularSystem);
        }
        let coefficients = cholesky.solve(&rhs).iter().copied().collect();

        Ok(Self {
            alpha,
            scaler,
            coefficients,
            intercept,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.scaler
            .transform(row)
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_handles_constant_column() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();

        assert_eq!(scaler.means, vec![2.0, 5.0]);
        assert_eq!(scaler.scales, vec![1.0, 1.0]);
        assert_eq!(scaler.transform(&[3.0, 5.0]), vec![1.0, 0.0]);
    }

    #[test]
    fn test_recovers_linear_relation_with_small_alpha() {
        // y = 2a - 3b + 7
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64])
            .collect();
        let targets: Vec<f64> = rows.iter().map(|r| 2.0 * r[0] - 3.0 * r[1] + 7.0).collect();

        let pipeline = RidgePipeline::fit(&rows, &targets, 1e-9).unwrap();

        assert!((pipeline.predict(&[10.0, 4.0]) - 15.0).abs() < 1e-6);
        assert!((pipeline.predict(&[50.0, 0.0]) - 107.0).abs() < 1e-6);
    }

    #[test]
    fn test_large_alpha_shrinks_to_mean() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|i| i as f64 * 4.0).collect();

        let pipeline = RidgePipeline::fit(&rows, &targets, 1e12).unwrap();

        assert!(pipeline.coefficients[0].abs() < 1e-6);
        assert!((pipeline.predict(&[100.0]) - 18.0).abs() < 1e-3);
    }

    #[test]
    fn test_single_column_matches_closed_form() {
        let rows: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let targets = vec![1.0, 3.0, 2.0, 6.0];
        let alpha = 2.0;

        let pipeline = RidgePipeline::fit(&rows, &targets, alpha).unwrap();

        // w = Σ x·(y - ȳ) / (Σ x² + α) on the standardized column
        let scaled: Vec<f64> = rows.iter().map(|r| pipeline.scaler.transform(r)[0]).collect();
        let mean = 3.0;
        let num: f64 = scaled.iter().zip(&targets).map(|(x, y)| x * (y - mean)).sum();
        let den: f64 = scaled.iter().map(|x| x * x).sum::<f64>() + alpha;

        assert!((pipeline.intercept - mean).abs() < 1e-12);
        assert!((pipeline.coefficients[0] - num / den).abs() < 1e-9);
    }

    #[test]
    fn test_singular_without_regularization() {
        let rows = vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]];
        let targets = vec![1.0, 2.0, 3.0];

        assert!(matches!(
            RidgePipeline::fit(&rows, &targets, 0.0),
            Err(Error::SingularSystem)
        ));
    }
}
