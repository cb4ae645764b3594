use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nba_edge::config::Config;
use nba_edge::db::GameStore;
use nba_edge::model::{ModelStore, DEFAULT_ALPHAS};
use nba_edge::models::{Game, Team};
use nba_edge::services::train_from_store;

/// Seed file of teams and games (scheduled or final)
#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(default)]
    teams: Vec<Team>,
    #[serde(default)]
    games: Vec<Game>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "train_model=info,nba_edge=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse arguments
    let args: Vec<String> = env::args().collect();
    let alphas = match arg_value(&args, "--alphas") {
        Some(raw) => parse_alphas(raw)?,
        None => DEFAULT_ALPHAS.to_vec(),
    };
    let dataset_out = arg_value(&args, "--dataset-out").map(PathBuf::from);

    let config = Config::from_env()?;
    let store = GameStore::new(&config.database_url).await?;

    if let Some(path) = arg_value(&args, "--import") {
        import(&store, Path::new(path)).await?;
    }

    let model_store = ModelStore::new(&config.model_dir);
    let run = train_from_store(&store, &model_store, &alphas).await?;

    if let Some(path) = dataset_out {
        let json = serde_json::to_string_pretty(&run.rows)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write dataset to {}", path.display()))?;
        info!("Wrote {} feature rows to {}", run.rows.len(), path.display());
    }

    let meta = &run.model.metadata;
    println!("Model: {} (alpha {})", meta.model_type, meta.best_alpha);
    for (split, m) in &meta.metrics {
        println!(
            "  {:<5} MAE {:>6.2}  RMSE {:>6.2}  direction {:>5.1}%  n={}",
            split,
            m.mae,
            m.rmse,
            m.direction_accuracy * 100.0,
            m.n_samples
        );
    }
    println!(
        "Sigma: {:.2} (from {})",
        meta.sigma,
        meta.sigma_split.as_str()
    );
    println!("Saved: {}", run.artifact_path.display());

    Ok(())
}

async fn import(store: &GameStore, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: ImportFile = serde_json::from_str(&content).context("Failed to parse import file")?;

    for team in &file.teams {
        store.upsert_team(team).await?;
    }
    for game in &file.games {
        store.upsert_game(game).await?;
    }

    info!(
        "Imported {} teams and {} games from {}",
        file.teams.len(),
        file.games.len(),
        path.display()
    );
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_alphas(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid alpha: {}", s))
        })
        .collect()
}
