use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::margin::TrainedModel;
use crate::error::Result;
use crate::features::FEATURE_COLUMNS;

const ARTIFACT_FILE: &str = "margin_model.json";

/// Reads and writes the model artifact in a directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    pub fn exists(&self) -> bool {
        self.artifact_path().exists()
    }

    /// Write the artifact, replacing any previous one in a single rename
    pub fn save(&self, model: &TrainedModel) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.artifact_path();
        let staging = self.dir.join(format!("{}.tmp", ARTIFACT_FILE));
        fs::write(&staging, serde_json::to_vec_pretty(model)?)?;
        fs::rename(&staging, &path)?;

        info!(
            "Model saved to {} (alpha {}, sigma {:.2})",
            path.display(),
            model.metadata.best_alpha,
            model.metadata.sigma
        );
        Ok(path)
    }

    /// Load the artifact, rejecting one trained on a different column layout
    pub fn load(&self) -> Result<TrainedModel> {
        load_from(&self.artifact_path())
    }
}

fn load_from(path: &Path) -> Result<TrainedModel> {
    let content = fs::read_to_string(path)?;
    let model: TrainedModel = serde_json::from_str(&content)?;
    model.check_columns(&FEATURE_COLUMNS)?;

    info!(
        "Loaded model from {} (trained {}, sigma {:.2})",
        path.display(),
        model.metadata.trained_at,
        model.metadata.sigma
    );
    Ok(model)
}

/// Shared reference to the current model
///
/// Readers take a cheap `Arc` clone; retraining swaps the whole model so no
/// reader ever sees a partially updated one.
#[derive(Debug, Clone, Default)]
pub struct ModelHandle {
    current: Arc<RwLock<Option<Arc<TrainedModel>>>>,
}

impl ModelHandle {
    pub fn new(model: Option<TrainedModel>) -> Self {
        Self {
            current: Arc::new(RwLock::new(model.map(Arc::new))),
        }
    }

    pub async fn current(&self) -> Option<Arc<TrainedModel>> {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, model: TrainedModel) {
        let model = Arc::new(model);
        *self.current.write().await = Some(model);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::error::Error;
    use crate::model::margin::{ModelMetadata, MODEL_TYPE};
    use crate::model::ridge::{RidgePipeline, StandardScaler};
    use crate::model::split::Split;

    fn model(columns: &[&str], sigma: f64) -> TrainedModel {
        let width = columns.len();
        TrainedModel {
            metadata: ModelMetadata {
                trained_at: Utc::now(),
                feature_columns: columns.iter().map(|c| c.to_string()).collect(),
                target_column: "y_margin".to_string(),
                model_type: MODEL_TYPE.to_string(),
                best_alpha: 10.0,
                metrics: BTreeMap::new(),
                train_seasons: vec!["2023-24".to_string()],
                val_seasons: Vec::new(),
                test_seasons: Vec::new(),
                sigma,
                sigma_split: Split::Train,
            },
            pipeline: RidgePipeline {
                alpha: 10.0,
                scaler: StandardScaler {
                    means: vec![0.0; width],
                    scales: vec![1.0; width],
                },
                coefficients: vec![0.5; width],
                intercept: 2.0,
            },
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = ModelStore::new(dir.path());
        assert!(!store.exists());

        let original = model(&FEATURE_COLUMNS, 14.4);
        store.save(&original).unwrap();

        assert_eq!(store.load().unwrap(), original);
    }

    #[test]
    fn test_load_rejects_column_mismatch() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = ModelStore::new(dir.path());
        store.save(&model(&["home_win_pct_to_date", "rest_diff"], 14.4)).unwrap();

        assert!(matches!(
            store.load(),
            Err(Error::ModelArtifactMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_swaps_whole_model() {
        let handle = ModelHandle::new(None);
        assert!(handle.current().await.is_none());

        handle.replace(model(&FEATURE_COLUMNS, 13.0)).await;
        let before = handle.current().await.unwrap();

        handle.replace(model(&FEATURE_COLUMNS, 12.0)).await;
        let after = handle.current().await.unwrap();

        assert_eq!(before.sigma(), 13.0);
        assert_eq!(after.sigma(), 12.0);
    }
}
