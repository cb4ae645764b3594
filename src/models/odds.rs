use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::game::GameId;

/// One sportsbook's posted prices for a game
///
/// Any field may be absent when the book has not posted that market.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookOdds {
    pub game_id: GameId,

    /// Bookmaker key (e.g., "draftkings")
    pub book_name: String,

    /// Home spread line (negative = home favored)
    pub spread_home_line: Option<f64>,
    pub spread_home_odds: Option<i32>,
    pub spread_away_line: Option<f64>,
    pub spread_away_odds: Option<i32>,

    pub moneyline_home_odds: Option<i32>,
    pub moneyline_away_odds: Option<i32>,

    pub total_line: Option<f64>,
    pub over_odds: Option<i32>,
    pub under_odds: Option<i32>,

    pub last_update: Option<DateTime<Utc>>,
}

/// Spread market (American odds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpreadMarket {
    /// Home line (negative if home favored, e.g., -6.5)
    pub home_line: f64,
    pub home_odds: i32,
    pub away_line: f64,
    pub away_odds: i32,
}

/// Moneyline market (American odds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MoneylineMarket {
    pub home_odds: i32,
    pub away_odds: i32,
}

/// Totals market (American odds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TotalMarket {
    pub line: f64,
    pub over_odds: i32,
    pub under_odds: i32,
}

/// One representative line per market for a game
///
/// A `None` market means no book has posted it yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsensusOdds {
    pub spread: Option<SpreadMarket>,
    pub moneyline: Option<MoneylineMarket>,
    pub total: Option<TotalMarket>,

    /// Book each market was taken from
    pub spread_book: Option<String>,
    pub moneyline_book: Option<String>,
    pub total_book: Option<String>,
}

impl ConsensusOdds {
    /// Whether any side market (spread or moneyline) is available
    pub fn has_side_markets(&self) -> bool {
        self.spread.is_some() || self.moneyline.is_some()
    }
}
