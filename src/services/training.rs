use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::GameStore;
use crate::features::{build_dataset, FeatureRow, FEATURE_COLUMNS};
use crate::model::{train, ModelStore, SeasonSplit, TrainedModel};
use crate::models::CompletedGame;

/// Output of one full training pass
pub struct TrainingRun {
    pub model: TrainedModel,
    pub rows: Vec<FeatureRow>,
    pub artifact_path: PathBuf,
}

/// Build the dataset and fit the model; latest season tests, the one before validates
pub fn fit_model(
    games: &[CompletedGame],
    alphas: &[f64],
) -> crate::Result<(TrainedModel, Vec<FeatureRow>)> {
    let rows = build_dataset(games)?;

    let seasons: Vec<String> = rows.iter().map(|r| r.season.clone()).collect();
    let policy = SeasonSplit::chronological(&seasons)?;

    let model = train(&rows, &FEATURE_COLUMNS, alphas, &policy)?;
    Ok((model, rows))
}

/// Train on every completed game in the store and save the artifact
pub async fn train_from_store(
    store: &GameStore,
    model_store: &ModelStore,
    alphas: &[f64],
) -> Result<TrainingRun> {
    let games = store.completed_games().await?;
    info!("Building dataset from {} completed games", games.len());

    let (model, rows) = fit_model(&games, alphas).context("Failed to train margin model")?;

    let artifact_path = model_store
        .save(&model)
        .context("Failed to save model artifact")?;

    Ok(TrainingRun {
        model,
        rows,
        artifact_path,
    })
}
