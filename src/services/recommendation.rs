use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::betting::{select_best_bet, ConsensusResolver, SelectorConfig};
use crate::db::GameStore;
use crate::features::GameSnapshot;
use crate::model::{ModelHandle, TrainedModel};
use crate::models::{BetRecommendation, Game};

/// Completed-games snapshot shared across inference calls
///
/// Loaded lazily on first use and dropped wholesale by `invalidate`.
#[derive(Debug, Default)]
pub struct InferenceCache {
    snapshot: RwLock<Option<Arc<GameSnapshot>>>,
}

impl InferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self, store: &GameStore) -> Result<Arc<GameSnapshot>> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let mut slot = self.snapshot.write().await;
        // Another caller may have loaded it while we waited
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(GameSnapshot::new(store.completed_games().await?)?);
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
        debug!("Inference cache invalidated");
    }
}

/// A scheduled game with its recommendation
#[derive(Debug, Clone, Serialize)]
pub struct GameRecommendation {
    pub game: Game,
    pub recommendation: BetRecommendation,
}

/// Turns stored games and odds into bet recommendations
#[derive(Clone)]
pub struct RecommendationService {
    store: GameStore,
    model: ModelHandle,
    cache: Arc<InferenceCache>,
    resolver: ConsensusResolver,
    selector: SelectorConfig,
    sigma_override: Option<f64>,
}

impl RecommendationService {
    pub fn new(
        store: GameStore,
        model: ModelHandle,
        cache: Arc<InferenceCache>,
        resolver: ConsensusResolver,
        selector: SelectorConfig,
    ) -> Self {
        Self {
            store,
            model,
            cache,
            resolver,
            selector,
            sigma_override: None,
        }
    }

    /// Use a fixed sigma instead of the model's residual RMSE
    pub fn with_sigma_override(mut self, sigma: Option<f64>) -> Self {
        self.sigma_override = sigma;
        self
    }

    pub async fn recommend_game(&self, game: &Game) -> Result<BetRecommendation> {
        let model = self.current_model().await?;
        let snapshot = self.cache.snapshot(&self.store).await?;
        self.recommend_with(&model, &snapshot, game).await
    }

    /// Recommendations for every unplayed game dated in `[from, to]`
    ///
    /// Games are scored independently: one that fails is logged and left out.
    pub async fn recommend_upcoming(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<GameRecommendation>> {
        let model = self.current_model().await?;
        let snapshot = self.cache.snapshot(&self.store).await?;

        let games = self.store.upcoming_games(from, to).await?;
        info!("Scoring {} upcoming games ({} to {})", games.len(), from, to);

        let mut results = Vec::with_capacity(games.len());
        for game in games {
            match self.recommend_with(&model, &snapshot, &game).await {
                Ok(recommendation) => results.push(GameRecommendation {
                    game,
                    recommendation,
                }),
                Err(e) => error!("Skipping game {}: {:#}", game.id, e),
            }
        }
        Ok(results)
    }

    async fn recommend_with(
        &self,
        model: &TrainedModel,
        snapshot: &GameSnapshot,
        game: &Game,
    ) -> Result<BetRecommendation> {
        let features = snapshot.features_for(game.home_team_id, game.away_team_id, game.date);
        let predicted_margin = model.predict(&features)?;

        let rows = self.store.odds_for_game(game.id).await?;
        let odds = self.resolver.resolve(&rows)?;

        let sigma = self.sigma_override.unwrap_or_else(|| model.sigma());
        let recommendation =
            select_best_bet(game.id, predicted_margin, sigma, odds.as_ref(), &self.selector)?;

        info!(
            "Game {} ({} vs {}): margin {:+.1}, tier {}",
            game.id,
            game.home_team_id,
            game.away_team_id,
            predicted_margin,
            recommendation.confidence_tier
        );
        Ok(recommendation)
    }

    async fn current_model(&self) -> Result<Arc<TrainedModel>> {
        self.model
            .current()
            .await
            .ok_or_else(|| anyhow!("No trained model loaded; run train_model first"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_ALPHAS;
    use crate::models::{BookOdds, ConfidenceTier, Team};
    use crate::services::training::fit_model;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Three seasons among six teams where higher ids are stronger
    fn history() -> Vec<Game> {
        let mut games = Vec::new();
        let mut id = 0;
        for (s, season) in ["2022-23", "2023-24", "2024-25"].iter().enumerate() {
            let start = date(2022 + s as i32, 10, 20);
            for day in 0..40i64 {
                for pair in 0..3i64 {
                    let home = (day + pair * 2) % 6 + 1;
                    let away = (day + pair * 2 + 1 + day % 4) % 6 + 1;
                    if home == away {
                        continue;
                    }
                    id += 1;
                    let noise = ((id * 37) % 13) as i32 - 6;
                    let strength = (home - away) as i32 * 3;
                    games.push(Game {
                        id,
                        date: start + chrono::Duration::days(day * 2),
                        season: season.to_string(),
                        home_team_id: home,
                        away_team_id: away,
                        home_score: Some(105 + strength + noise + 2),
                        away_score: Some(105),
                        is_completed: true,
                        start_time: None,
                    });
                }
            }
        }
        games
    }

    async fn seeded_store(dir: &tempfile::TempDir) -> GameStore {
        let url = format!("sqlite:{}", dir.path().join("nba.db").display());
        let store = GameStore::new(&url).await.unwrap();
        for id in 1..=6 {
            store
                .upsert_team(&Team {
                    id,
                    name: format!("Team {}", id),
                    abbreviation: format!("T{}", id),
                })
                .await
                .unwrap();
        }
        for game in history() {
            store.upsert_game(&game).await.unwrap();
        }
        store
    }

    fn upcoming(id: i64, home: i64, away: i64) -> Game {
        Game {
            id,
            date: date(2025, 3, 1),
            season: "2024-25".to_string(),
            home_team_id: home,
            away_team_id: away,
            home_score: None,
            away_score: None,
            is_completed: false,
            start_time: None,
        }
    }

    async fn service(store: &GameStore) -> RecommendationService {
        let games = store.completed_games().await.unwrap();
        let (model, _) = fit_model(&games, &DEFAULT_ALPHAS).unwrap();
        RecommendationService::new(
            store.clone(),
            ModelHandle::new(Some(model)),
            Arc::new(InferenceCache::new()),
            ConsensusResolver::new(Some("draftkings".to_string())),
            SelectorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_recommend_upcoming() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;

        store.upsert_game(&upcoming(1001, 6, 1)).await.unwrap();
        store.upsert_game(&upcoming(1002, 1, 6)).await.unwrap();
        store
            .replace_odds(
                1001,
                &[BookOdds {
                    game_id: 1001,
                    book_name: "draftkings".to_string(),
                    moneyline_home_odds: Some(110),
                    moneyline_away_odds: Some(-130),
                    ..Default::default()
                }],
            )
            .await
            .unwrap();

        let service = service(&store).await;
        let results = service
            .recommend_upcoming(date(2025, 2, 28), date(2025, 3, 2))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);

        let strong_home = &results[0].recommendation;
        assert_eq!(strong_home.game_id, 1001);
        assert!(strong_home.predicted_margin > 0.0);
        assert_ne!(strong_home.confidence_tier, ConfidenceTier::NoOdds);

        let no_odds = &results[1].recommendation;
        assert_eq!(no_odds.confidence_tier, ConfidenceTier::NoOdds);
        assert!(no_odds.predicted_margin < 0.0);
    }

    #[tokio::test]
    async fn test_bad_odds_only_drop_their_game() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;

        store.upsert_game(&upcoming(1001, 6, 1)).await.unwrap();
        store.upsert_game(&upcoming(1002, 1, 6)).await.unwrap();
        store
            .replace_odds(
                1002,
                &[
                    BookOdds {
                        game_id: 1002,
                        book_name: "draftkings".to_string(),
                        moneyline_home_odds: Some(300),
                        moneyline_away_odds: Some(-380),
                        ..Default::default()
                    },
                    BookOdds {
                        game_id: 1002,
                        book_name: "zbook".to_string(),
                        total_line: Some(219.5),
                        over_odds: Some(-50),
                        under_odds: Some(-110),
                        ..Default::default()
                    },
                ],
            )
            .await
            .unwrap();

        let service = service(&store).await;
        let results = service
            .recommend_upcoming(date(2025, 2, 28), date(2025, 3, 2))
            .await
            .unwrap();

        let ids: Vec<i64> = results.iter().map(|r| r.game.id).collect();
        assert_eq!(ids, vec![1001]);
        assert!(service.recommend_game(&upcoming(1002, 1, 6)).await.is_err());
    }

    #[tokio::test]
    async fn test_sigma_override_and_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;
        let game = upcoming(1001, 6, 1);
        store.upsert_game(&game).await.unwrap();

        let service = service(&store).await.with_sigma_override(Some(9.0));
        let rec = service.recommend_game(&game).await.unwrap();
        assert_eq!(rec.sigma, 9.0);

        let empty = RecommendationService::new(
            store.clone(),
            ModelHandle::new(None),
            Arc::new(InferenceCache::new()),
            ConsensusResolver::default(),
            SelectorConfig::default(),
        );
        assert!(empty.recommend_game(&game).await.is_err());
    }

    #[tokio::test]
    async fn test_cache_reloads_after_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;
        let cache = InferenceCache::new();

        let first = cache.snapshot(&store).await.unwrap();
        let again = cache.snapshot(&store).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let mut extra = upcoming(2000, 2, 3);
        extra.home_score = Some(100);
        extra.away_score = Some(90);
        extra.is_completed = true;
        store.upsert_game(&extra).await.unwrap();

        cache.invalidate().await;
        let reloaded = cache.snapshot(&store).await.unwrap();
        assert_eq!(reloaded.len(), first.len() + 1);
    }
}
