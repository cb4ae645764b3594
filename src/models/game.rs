use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type TeamId = i64;
pub type GameId = i64;

/// An NBA franchise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,

    /// Full name as used by odds providers (e.g., "Boston Celtics")
    pub name: String,

    /// Three-letter abbreviation (e.g., "BOS")
    pub abbreviation: String,
}

/// A scheduled or finished game as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,

    /// Local (US Eastern) calendar date of tip-off
    pub date: NaiveDate,

    /// Season label (e.g., "2024-25")
    pub season: String,

    pub home_team_id: TeamId,
    pub away_team_id: TeamId,

    pub home_score: Option<i32>,
    pub away_score: Option<i32>,

    pub is_completed: bool,

    /// Scheduled tip-off time, when known
    pub start_time: Option<DateTime<Utc>>,
}

impl Game {
    /// Final result, if the game is completed and both scores are present
    pub fn as_completed(&self) -> Option<CompletedGame> {
        if !self.is_completed {
            return None;
        }

        Some(CompletedGame {
            game_id: self.id,
            date: self.date,
            season: self.season.clone(),
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            home_score: self.home_score?,
            away_score: self.away_score?,
        })
    }
}

/// A finished game with a final score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletedGame {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub season: String,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: i32,
    pub away_score: i32,
}

impl CompletedGame {
    /// Home score minus away score
    pub fn margin(&self) -> i32 {
        self.home_score - self.away_score
    }

    /// Reject records that would corrupt team state
    pub fn validate(&self) -> Result<()> {
        let reason = if self.home_score < 0 || self.away_score < 0 {
            Some(format!(
                "negative score {}-{}",
                self.home_score, self.away_score
            ))
        } else if self.home_team_id == self.away_team_id {
            Some(format!("team {} listed on both sides", self.home_team_id))
        } else if self.season.trim().is_empty() {
            Some("empty season".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidGame {
                game_id: self.game_id,
                reason,
            }),
            None => Ok(()),
        }
    }
}
