use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{error, info, warn};

use crate::db::GameStore;
use crate::model::{ModelHandle, ModelStore};
use crate::services::{train_from_store, InferenceCache};

/// Worker that periodically retrains the margin model
///
/// A successful run swaps the shared model and drops the attached inference
/// cache, if any; a failed run leaves both in place.
pub struct RetrainerWorker {
    store: GameStore,
    model_store: ModelStore,
    handle: ModelHandle,
    cache: Option<Arc<InferenceCache>>,
    alphas: Vec<f64>,
    retrain_interval: Duration,
}

impl RetrainerWorker {
    pub fn new(
        store: GameStore,
        model_store: ModelStore,
        handle: ModelHandle,
        alphas: Vec<f64>,
        retrain_interval_secs: u64,
    ) -> Self {
        Self {
            store,
            model_store,
            handle,
            cache: None,
            alphas,
            retrain_interval: Duration::from_secs(retrain_interval_secs),
        }
    }

    /// Invalidate `cache` after every successful retrain
    pub fn with_cache(mut self, cache: Arc<InferenceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run the worker loop
    pub async fn run(&self) {
        info!(
            "Retrainer started (interval: {:?})",
            self.retrain_interval
        );

        let mut interval = time::interval(self.retrain_interval);
        // First tick fires immediately; skip it when a model is already loaded
        if self.handle.current().await.is_some() {
            interval.tick().await;
        }

        loop {
            interval.tick().await;

            if let Err(e) = self.retrain().await {
                error!("Retraining failed: {:#}", e);
                warn!("Keeping previous model, will retry on next interval");
            }
        }
    }

    pub async fn retrain(&self) -> anyhow::Result<()> {
        let run = train_from_store(&self.store, &self.model_store, &self.alphas).await?;

        self.handle.replace(run.model).await;
        if let Some(cache) = &self.cache {
            cache.invalidate().await;
        }

        info!("Model swapped ({} training rows)", run.rows.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::DEFAULT_ALPHAS;
    use crate::models::{Game, Team};

    fn final_game(id: i64, date: NaiveDate, season: &str, home: i64, away: i64) -> Game {
        let noise = ((id * 37) % 13) as i32 - 6;
        Game {
            id,
            date,
            season: season.to_string(),
            home_team_id: home,
            away_team_id: away,
            home_score: Some(107 + (home - away) as i32 * 3 + noise),
            away_score: Some(105),
            is_completed: true,
            start_time: None,
        }
    }

    async fn store(dir: &tempfile::TempDir, seasons: &[&str]) -> GameStore {
        let url = format!("sqlite:{}", dir.path().join("nba.db").display());
        let store = GameStore::new(&url).await.unwrap();
        for id in 1..=4 {
            store
                .upsert_team(&Team {
                    id,
                    name: format!("Team {}", id),
                    abbreviation: format!("T{}", id),
                })
                .await
                .unwrap();
        }

        let mut id = 0;
        for (s, season) in seasons.iter().enumerate() {
            let start = NaiveDate::from_ymd_opt(2022 + s as i32, 10, 20).unwrap();
            for day in 0..30i64 {
                let pairs = [
                    (1 + day % 4, 1 + (day + 1) % 4),
                    (1 + (day + 2) % 4, 1 + (day + 3) % 4),
                ];
                for (home, away) in pairs {
                    id += 1;
                    let date = start + chrono::Duration::days(day * 2);
                    store
                        .upsert_game(&final_game(id, date, season, home, away))
                        .await
                        .unwrap();
                }
            }
        }
        store
    }

    fn worker(
        store: GameStore,
        dir: &tempfile::TempDir,
        handle: &ModelHandle,
        cache: &Arc<InferenceCache>,
    ) -> RetrainerWorker {
        RetrainerWorker::new(
            store,
            ModelStore::new(dir.path().join("artifacts")),
            handle.clone(),
            DEFAULT_ALPHAS.to_vec(),
            3600,
        )
        .with_cache(Arc::clone(cache))
    }

    #[tokio::test]
    async fn test_retrain_swaps_model_and_reloads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, &["2022-23", "2023-24", "2024-25"]).await;
        let handle = ModelHandle::new(None);
        let cache = Arc::new(InferenceCache::new());
        let worker = worker(store.clone(), &dir, &handle, &cache);

        let before = cache.snapshot(&store).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        store
            .upsert_game(&final_game(9000, date, "2024-25", 4, 1))
            .await
            .unwrap();

        worker.retrain().await.unwrap();

        let model = handle.current().await.unwrap();
        assert!(model.sigma() > 0.0);
        assert_eq!(model.metadata.test_seasons, vec!["2024-25".to_string()]);
        assert!(ModelStore::new(dir.path().join("artifacts")).exists());

        let after = cache.snapshot(&store).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.len(), before.len() + 1);
    }

    #[tokio::test]
    async fn test_failed_retrain_keeps_previous_model() {
        let dir = tempfile::tempdir().unwrap();
        let trained = store(&dir, &["2022-23", "2023-24"]).await;
        let handle = ModelHandle::new(None);
        let cache = Arc::new(InferenceCache::new());
        worker(trained, &dir, &handle, &cache).retrain().await.unwrap();
        let previous = handle.current().await.unwrap();

        let empty_dir = tempfile::tempdir().unwrap();
        let empty = store(&empty_dir, &[]).await;
        let snapshot = cache.snapshot(&empty).await.unwrap();

        let failing = worker(empty.clone(), &empty_dir, &handle, &cache);
        assert!(failing.retrain().await.is_err());

        let current = handle.current().await.unwrap();
        assert!(Arc::ptr_eq(&previous, &current));

        // Cache is left alone on failure
        let unchanged = cache.snapshot(&empty).await.unwrap();
        assert!(Arc::ptr_eq(&snapshot, &unchanged));
    }

    #[tokio::test]
    async fn test_retrain_without_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, &["2022-23", "2023-24"]).await;
        let handle = ModelHandle::new(None);
        let worker = RetrainerWorker::new(
            store,
            ModelStore::new(dir.path().join("artifacts")),
            handle.clone(),
            DEFAULT_ALPHAS.to_vec(),
            3600,
        );

        worker.retrain().await.unwrap();
        assert!(handle.current().await.is_some());
    }
}
