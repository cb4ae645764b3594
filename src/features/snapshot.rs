use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::dataset::{apply_game, MatchupFeatures};
use super::team_state::TeamState;
use crate::error::Result;
use crate::models::{CompletedGame, TeamId};

type TeamStates = HashMap<TeamId, TeamState>;

/// Completed games loaded once for inference, with team states memoized per date
///
/// The snapshot is immutable; replace it wholesale when new results arrive.
#[derive(Debug)]
pub struct GameSnapshot {
    games: Vec<CompletedGame>,
    states_by_date: Mutex<HashMap<NaiveDate, Arc<TeamStates>>>,
}

impl GameSnapshot {
    pub fn new(mut games: Vec<CompletedGame>) -> Result<Self> {
        for game in &games {
            game.validate()?;
        }
        games.sort_by_key(|g| (g.date, g.game_id));

        match (games.first(), games.last()) {
            (Some(first), Some(last)) => info!(
                "Loaded {} completed games ({} to {})",
                games.len(),
                first.date,
                last.date
            ),
            _ => info!("No completed games in snapshot"),
        }

        Ok(Self {
            games,
            states_by_date: Mutex::new(HashMap::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Team states built from games dated strictly before `date`
    pub fn states_before(&self, date: NaiveDate) -> Arc<TeamStates> {
        let mut cache = self
            .states_by_date
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(states) = cache.get(&date) {
            return Arc::clone(states);
        }

        let mut states = TeamStates::new();
        for game in self.games.iter().take_while(|g| g.date < date) {
            apply_game(&mut states, game);
        }
        debug!("Built team states for {} ({} teams)", date, states.len());

        let states = Arc::new(states);
        cache.insert(date, Arc::clone(&states));
        states
    }

    /// Pre-game features for a matchup on `date`
    pub fn features_for(
        &self,
        home_team_id: TeamId,
        away_team_id: TeamId,
        date: NaiveDate,
    ) -> MatchupFeatures {
        let states = self.states_before(date);
        let empty = TeamState::default();

        MatchupFeatures::from_states(
            states.get(&home_team_id).unwrap_or(&empty),
            states.get(&away_team_id).unwrap_or(&empty),
            date,
        )
    }
}
