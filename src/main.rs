use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nba_edge::api::OddsApiClient;
use nba_edge::config::Config;
use nba_edge::db::GameStore;
use nba_edge::matching::TeamResolver;
use nba_edge::model::{ModelHandle, ModelStore, DEFAULT_ALPHAS};
use nba_edge::workers::{OddsRefresherWorker, RetrainerWorker};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nba_edge=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting nba-edge");

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let store = GameStore::new(&config.database_url).await?;
    info!("Database initialized");

    let model_store = ModelStore::new(&config.model_dir);
    let model = if model_store.exists() {
        match model_store.load() {
            Ok(model) => Some(model),
            Err(e) => {
                warn!("Ignoring unusable model artifact: {}", e);
                None
            }
        }
    } else {
        info!("No model artifact yet, retrainer will build one");
        None
    };
    let handle = ModelHandle::new(model);

    let retrainer = RetrainerWorker::new(
        store.clone(),
        model_store,
        handle,
        DEFAULT_ALPHAS.to_vec(),
        config.retrain_interval,
    );

    let retrainer_handle = tokio::spawn(async move {
        retrainer.run().await;
    });

    let refresher_handle = match &config.odds_api_key {
        Some(key) => {
            let mut resolver = TeamResolver::from_teams(&store.list_teams().await?);
            if let Some(path) = &config.team_aliases_path {
                resolver.load_aliases(path)?;
            }
            info!("Team resolver initialized ({} names)", resolver.len());

            let refresher = OddsRefresherWorker::new(
                OddsApiClient::new(&config.odds_api_url, key),
                store.clone(),
                resolver,
                config.odds_refresh_interval,
            );
            Some(tokio::spawn(async move {
                refresher.run().await;
            }))
        }
        None => {
            warn!("ODDS_API_KEY not set, odds refresh disabled");
            None
        }
    };

    info!("All workers started");

    let refresher_done = async {
        match refresher_handle {
            Some(handle) => handle.await,
            None => std::future::pending().await,
        }
    };

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = retrainer_handle => {
            error!("Retrainer exited unexpectedly: {:?}", result);
        }
        result = refresher_done => {
            error!("Odds refresher exited unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down nba-edge");
    Ok(())
}
