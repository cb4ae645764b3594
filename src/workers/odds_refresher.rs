use std::time::Duration;

use anyhow::Result;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::api::{OddsApiClient, OddsEvent};
use crate::db::GameStore;
use crate::matching::TeamResolver;

/// Worker that periodically pulls odds and replaces each game's rows
pub struct OddsRefresherWorker {
    client: OddsApiClient,
    store: GameStore,
    resolver: TeamResolver,
    refresh_interval: Duration,
}

/// Outcome counts for one refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub stored: usize,
    pub skipped: usize,
}

impl OddsRefresherWorker {
    pub fn new(
        client: OddsApiClient,
        store: GameStore,
        resolver: TeamResolver,
        refresh_interval_secs: u64,
    ) -> Self {
        Self {
            client,
            store,
            resolver,
            refresh_interval: Duration::from_secs(refresh_interval_secs),
        }
    }

    /// Run the worker loop
    pub async fn run(&self) {
        info!(
            "Odds refresher started (interval: {:?})",
            self.refresh_interval
        );

        let mut interval = time::interval(self.refresh_interval);

        loop {
            interval.tick().await;

            match self.refresh().await {
                Ok(stats) => info!(
                    "Odds refresh complete: {} games stored, {} skipped",
                    stats.stored, stats.skipped
                ),
                Err(e) => {
                    error!("Failed to refresh odds: {:#}", e);
                    warn!("Will retry on next interval");
                }
            }
        }
    }

    /// Perform a single refresh
    pub async fn refresh(&self) -> Result<RefreshStats> {
        let events = self.client.fetch_odds().await?;
        info!("Fetched odds for {} events", events.len());

        self.store_events(&events).await
    }

    /// Match events to scheduled games and replace their odds rows
    pub async fn store_events(&self, events: &[OddsEvent]) -> Result<RefreshStats> {
        let mut stats = RefreshStats::default();

        for event in events {
            let (Some(home), Some(away)) = (
                self.resolver.resolve(&event.home_team),
                self.resolver.resolve(&event.away_team),
            ) else {
                warn!(
                    "Skipping {} @ {}: unknown team",
                    event.away_team, event.home_team
                );
                stats.skipped += 1;
                continue;
            };

            let date = event.game_date();
            let Some(game) = self.store.find_game(home, away, date).await? else {
                debug!(
                    "No scheduled game for {} @ {} on {}",
                    event.away_team, event.home_team, date
                );
                stats.skipped += 1;
                continue;
            };

            let rows = event.book_odds(game.id);
            self.store.replace_odds(game.id, &rows).await?;
            stats.stored += 1;
        }

        Ok(stats)
    }
}
