use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::team_state::TeamState;
use crate::error::Result;
use crate::models::{CompletedGame, GameId, TeamId};

/// Model input columns, in the order the regressor sees them
pub const FEATURE_COLUMNS: [&str; 11] = [
    "home_win_pct_to_date",
    "away_win_pct_to_date",
    "win_pct_diff",
    "home_last10_margin",
    "away_last10_margin",
    "last10_margin_diff",
    "home_home_margin_to_date",
    "away_away_margin_to_date",
    "rest_diff",
    "home_b2b",
    "away_b2b",
];

pub const TARGET_COLUMN: &str = "y_margin";

/// Rest value fed to the model when a team has no previous game
pub const FIRST_GAME_REST_DAYS: i64 = 3;

/// Anything that can supply named numeric features
pub trait FeatureSource {
    fn feature(&self, name: &str) -> Option<f64>;
}

impl FeatureSource for HashMap<String, f64> {
    fn feature(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

/// Pre-game features for one matchup, derived only from prior games
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchupFeatures {
    pub home_win_pct_to_date: f64,
    pub away_win_pct_to_date: f64,
    pub win_pct_diff: f64,

    pub home_avg_margin_to_date: f64,
    pub away_avg_margin_to_date: f64,

    pub home_last10_margin: f64,
    pub away_last10_margin: f64,
    pub last10_margin_diff: f64,

    pub home_home_margin_to_date: f64,
    pub away_away_margin_to_date: f64,

    /// `None` on a team's first game
    pub home_rest_days: Option<i64>,
    pub away_rest_days: Option<i64>,
    pub rest_diff: f64,
    pub home_b2b: bool,
    pub away_b2b: bool,

    pub home_games_to_date: u32,
    pub away_games_to_date: u32,
}

impl MatchupFeatures {
    /// Read both teams' current state for a game on `date`
    pub fn from_states(home: &TeamState, away: &TeamState, date: NaiveDate) -> Self {
        let home_win_pct = home.win_pct();
        let away_win_pct = away.win_pct();
        let home_last10 = home.last10_avg_margin();
        let away_last10 = away.last10_avg_margin();
        let home_rest = home.rest_days(date);
        let away_rest = away.rest_days(date);

        let rest_diff = home_rest.unwrap_or(FIRST_GAME_REST_DAYS)
            - away_rest.unwrap_or(FIRST_GAME_REST_DAYS);

        Self {
            home_win_pct_to_date: home_win_pct,
            away_win_pct_to_date: away_win_pct,
            win_pct_diff: home_win_pct - away_win_pct,
            home_avg_margin_to_date: home.avg_margin(),
            away_avg_margin_to_date: away.avg_margin(),
            home_last10_margin: home_last10,
            away_last10_margin: away_last10,
            last10_margin_diff: home_last10 - away_last10,
            home_home_margin_to_date: home.home_avg_margin(),
            away_away_margin_to_date: away.away_avg_margin(),
            home_rest_days: home_rest,
            away_rest_days: away_rest,
            rest_diff: rest_diff as f64,
            home_b2b: home.is_back_to_back(date),
            away_b2b: away.is_back_to_back(date),
            home_games_to_date: home.games_played,
            away_games_to_date: away.games_played,
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl FeatureSource for MatchupFeatures {
    fn feature(&self, name: &str) -> Option<f64> {
        let value = match name {
            "home_win_pct_to_date" => self.home_win_pct_to_date,
            "away_win_pct_to_date" => self.away_win_pct_to_date,
            "win_pct_diff" => self.win_pct_diff,
            "home_avg_margin_to_date" => self.home_avg_margin_to_date,
            "away_avg_margin_to_date" => self.away_avg_margin_to_date,
            "home_last10_margin" => self.home_last10_margin,
            "away_last10_margin" => self.away_last10_margin,
            "last10_margin_diff" => self.last10_margin_diff,
            "home_home_margin_to_date" => self.home_home_margin_to_date,
            "away_away_margin_to_date" => self.away_away_margin_to_date,
            "home_rest_days" => self.home_rest_days.unwrap_or(FIRST_GAME_REST_DAYS) as f64,
            "away_rest_days" => self.away_rest_days.unwrap_or(FIRST_GAME_REST_DAYS) as f64,
            "rest_diff" => self.rest_diff,
            "home_b2b" => flag(self.home_b2b),
            "away_b2b" => flag(self.away_b2b),
            "home_games_to_date" => f64::from(self.home_games_to_date),
            "away_games_to_date" => f64::from(self.away_games_to_date),
            _ => return None,
        };
        Some(value)
    }
}

/// One training example: identifiers, target, and pre-game features
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRow {
    pub game_id: GameId,
    pub game_date: NaiveDate,
    pub season: String,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,

    /// Home score minus away score
    pub y_margin: f64,

    #[serde(flatten)]
    pub features: MatchupFeatures,
}

impl FeatureSource for FeatureRow {
    fn feature(&self, name: &str) -> Option<f64> {
        self.features.feature(name)
    }
}

/// Builds leakage-free feature rows in a single chronological pass
///
/// Games sharing a date are all featurized from the state as of the end of
/// the previous date, then applied together, so a row never sees any result
/// from its own date.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    team_states: HashMap<TeamId, TeamState>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one row per completed game
    ///
    /// Input order does not matter: games are processed by (date, game id).
    pub fn build(&mut self, games: &[CompletedGame]) -> Result<Vec<FeatureRow>> {
        for game in games {
            game.validate()?;
        }

        let mut ordered: Vec<&CompletedGame> = games.iter().collect();
        ordered.sort_by_key(|g| (g.date, g.game_id));

        self.team_states.clear();
        let mut rows = Vec::with_capacity(ordered.len());

        for day in ordered.chunk_by(|a, b| a.date == b.date) {
            for game in day {
                rows.push(self.extract(game));
            }
            for game in day {
                self.apply(game);
            }
        }

        info!(
            "Dataset built: {} rows across {} teams",
            rows.len(),
            self.team_states.len()
        );
        Ok(rows)
    }

    fn extract(&self, game: &CompletedGame) -> FeatureRow {
        let empty = TeamState::default();
        let home = self.team_states.get(&game.home_team_id).unwrap_or(&empty);
        let away = self.team_states.get(&game.away_team_id).unwrap_or(&empty);

        FeatureRow {
            game_id: game.game_id,
            game_date: game.date,
            season: game.season.clone(),
            home_team_id: game.home_team_id,
            away_team_id: game.away_team_id,
            y_margin: f64::from(game.margin()),
            features: MatchupFeatures::from_states(home, away, game.date),
        }
    }

    fn apply(&mut self, game: &CompletedGame) {
        apply_game(&mut self.team_states, game);
    }
}

/// Fold one finished game into both teams' state
pub(crate) fn apply_game(states: &mut HashMap<TeamId, TeamState>, game: &CompletedGame) {
    states.entry(game.home_team_id).or_default().update(
        game.home_score,
        game.away_score,
        true,
        game.date,
    );
    states.entry(game.away_team_id).or_default().update(
        game.away_score,
        game.home_score,
        false,
        game.date,
    );
}

/// Convenience wrapper for a fresh builder
pub fn build_dataset(games: &[CompletedGame]) -> Result<Vec<FeatureRow>> {
    DatasetBuilder::new().build(games)
}
