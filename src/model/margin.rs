use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ridge::RidgePipeline;
use super::split::{Split, SplitPolicy};
use crate::error::{Error, Result};
use crate::features::{FeatureRow, FeatureSource, TARGET_COLUMN};

/// Ridge penalties tried when none are given
pub const DEFAULT_ALPHAS: [f64; 5] = [0.1, 1.0, 10.0, 50.0, 100.0];

pub const MODEL_TYPE: &str = "ridge";

/// Error summary for one partition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SplitMetrics {
    pub mae: f64,
    pub rmse: f64,

    /// Share of games where the predicted and actual winner agree
    pub direction_accuracy: f64,

    pub n_samples: usize,
}

impl SplitMetrics {
    fn compute(predictions: &[f64], targets: &[f64]) -> Self {
        let n = targets.len();
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut correct = 0usize;

        for (pred, actual) in predictions.iter().zip(targets) {
            let err = pred - actual;
            abs_sum += err.abs();
            sq_sum += err * err;
            if (*pred > 0.0) == (*actual > 0.0) {
                correct += 1;
            }
        }

        let denom = n.max(1) as f64;
        Self {
            mae: abs_sum / denom,
            rmse: (sq_sum / denom).sqrt(),
            direction_accuracy: correct as f64 / denom,
            n_samples: n,
        }
    }
}

/// Everything recorded alongside the fitted pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub trained_at: DateTime<Utc>,
    pub feature_columns: Vec<String>,
    pub target_column: String,
    pub model_type: String,
    pub best_alpha: f64,

    /// Keyed by "train" / "val" / "test"
    pub metrics: BTreeMap<String, SplitMetrics>,

    pub train_seasons: Vec<String>,
    pub val_seasons: Vec<String>,
    pub test_seasons: Vec<String>,

    /// Residual RMSE used as calibration uncertainty
    pub sigma: f64,

    /// Partition the sigma was measured on
    pub sigma_split: Split,
}

/// Fitted margin model; immutable once built
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainedModel {
    pub metadata: ModelMetadata,
    pub pipeline: RidgePipeline,
}

impl TrainedModel {
    pub fn feature_columns(&self) -> &[String] {
        &self.metadata.feature_columns
    }

    pub fn sigma(&self) -> f64 {
        self.metadata.sigma
    }

    /// Fail unless the model was trained on exactly `expected`, in order
    pub fn check_columns(&self, expected: &[&str]) -> Result<()> {
        let matches = self.metadata.feature_columns.len() == expected.len()
            && self
                .metadata
                .feature_columns
                .iter()
                .zip(expected)
                .all(|(have, want)| have == want);

        if matches && self.pipeline.coefficients.len() == expected.len() {
            Ok(())
        } else {
            Err(Error::ModelArtifactMismatch {
                expected: expected.iter().map(|c| c.to_string()).collect(),
                found: self.metadata.feature_columns.clone(),
            })
        }
    }

    /// Predicted home margin; columns are looked up by name in model order
    pub fn predict<S: FeatureSource + ?Sized>(&self, source: &S) -> Result<f64> {
        let row = feature_vector(source, &self.metadata.feature_columns)?;
        Ok(self.pipeline.predict(&row))
    }
}

fn feature_vector<S, C>(source: &S, columns: &[C]) -> Result<Vec<f64>>
where
    S: FeatureSource + ?Sized,
    C: AsRef<str>,
{
    columns
        .iter()
        .map(|column| {
            let name = column.as_ref();
            source
                .feature(name)
                .ok_or_else(|| Error::MissingFeature(name.to_string()))
        })
        .collect()
}

#[derive(Default)]
struct Partition {
    rows: Vec<Vec<f64>>,
    targets: Vec<f64>,
    seasons: BTreeSet<String>,
}

impl Partition {
    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fit the margin model, selecting alpha by validation MAE
///
/// The scaler is fit on training rows only; validation and test rows are
/// transformed with the training statistics.
pub fn train<P: SplitPolicy + ?Sized>(
    rows: &[FeatureRow],
    feature_columns: &[&str],
    alphas: &[f64],
    policy: &P,
) -> Result<TrainedModel> {
    if alphas.is_empty() || alphas.iter().any(|a| !a.is_finite() || *a < 0.0) {
        return Err(Error::InsufficientData(format!(
            "alpha candidates must be non-negative: {:?}",
            alphas
        )));
    }

    let mut partitions: BTreeMap<Split, Partition> = BTreeMap::new();
    for row in rows {
        let Some(split) = policy.assign(&row.season) else {
            continue;
        };
        let partition = partitions.entry(split).or_default();
        partition.rows.push(feature_vector(row, feature_columns)?);
        partition.targets.push(row.y_margin);
        partition.seasons.insert(row.season.clone());
    }

    let empty = Partition::default();
    let train_part = partitions.get(&Split::Train).unwrap_or(&empty);
    let val_part = partitions.get(&Split::Validation).unwrap_or(&empty);
    let test_part = partitions.get(&Split::Test).unwrap_or(&empty);

    if train_part.is_empty() {
        return Err(Error::InsufficientData("no training rows".to_string()));
    }

    info!(
        "Training on {} rows (val {}, test {})",
        train_part.rows.len(),
        val_part.rows.len(),
        test_part.rows.len()
    );

    let selection = if val_part.is_empty() {
        warn!("No validation rows, selecting alpha on training rows");
        train_part
    } else {
        val_part
    };

    let mut best: Option<(f64, RidgePipeline)> = None;
    for &alpha in alphas {
        let pipeline = RidgePipeline::fit(&train_part.rows, &train_part.targets, alpha)?;
        let mae = evaluate(&pipeline, selection).mae;
        info!("alpha={:>8.3} -> selection MAE {:.3}", alpha, mae);

        if best.as_ref().map_or(true, |(best_mae, _)| mae < *best_mae) {
            best = Some((mae, pipeline));
        }
    }
    let (best_mae, pipeline) =
        best.ok_or_else(|| Error::InsufficientData("no alpha candidates".to_string()))?;
    info!("Best alpha {} (MAE {:.3})", pipeline.alpha, best_mae);

    let mut metrics = BTreeMap::new();
    for (split, partition) in [
        (Split::Train, train_part),
        (Split::Validation, val_part),
        (Split::Test, test_part),
    ] {
        if partition.is_empty() {
            continue;
        }
        let m = evaluate(&pipeline, partition);
        info!(
            "{:<5} MAE {:.2} RMSE {:.2} direction {:.1}% (n={})",
            split.as_str(),
            m.mae,
            m.rmse,
            m.direction_accuracy * 100.0,
            m.n_samples
        );
        metrics.insert(split.as_str().to_string(), m);
    }

    let (sigma_split, sigma) = [Split::Test, Split::Validation, Split::Train]
        .into_iter()
        .find_map(|split| metrics.get(split.as_str()).map(|m| (split, m.rmse)))
        .ok_or_else(|| Error::InsufficientData("no metrics computed".to_string()))?;
    if sigma_split != Split::Test {
        warn!("No test rows, sigma taken from {} RMSE", sigma_split.as_str());
    }
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(Error::InvalidSigma(sigma));
    }

    let seasons = |p: &Partition| p.seasons.iter().cloned().collect::<Vec<_>>();

    Ok(TrainedModel {
        metadata: ModelMetadata {
            trained_at: Utc::now(),
            feature_columns: feature_columns.iter().map(|c| c.to_string()).collect(),
            target_column: TARGET_COLUMN.to_string(),
            model_type: MODEL_TYPE.to_string(),
            best_alpha: pipeline.alpha,
            metrics,
            train_seasons: seasons(train_part),
            val_seasons: seasons(val_part),
            test_seasons: seasons(test_part),
            sigma,
            sigma_split,
        },
        pipeline,
    })
}

fn evaluate(pipeline: &RidgePipeline, partition: &Partition) -> SplitMetrics {
    let predictions: Vec<f64> = partition.rows.iter().map(|r| pipeline.predict(r)).collect();
    SplitMetrics::compute(&predictions, &partition.targets)
}
