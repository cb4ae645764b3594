use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Games kept in the recent-form window
pub const RECENT_WINDOW: usize = 10;

/// Running statistics for one team, updated after each of its games
///
/// Readers see only the games applied so far; callers must read features
/// before applying the game they describe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamState {
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,

    /// Sum of own score minus opponent score
    pub cumulative_margin_sum: f64,

    pub home_margin_sum: f64,
    pub home_games: u32,

    pub away_margin_sum: f64,
    pub away_games: u32,

    /// Most recent margins, oldest first
    pub last10_margins: VecDeque<f64>,

    pub last_game_date: Option<NaiveDate>,
}

impl TeamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a finished game from this team's point of view
    pub fn update(&mut self, own_score: i32, opp_score: i32, is_home: bool, game_date: NaiveDate) {
        let margin = f64::from(own_score - opp_score);

        self.games_played += 1;
        if margin > 0.0 {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.cumulative_margin_sum += margin;

        if is_home {
            self.home_games += 1;
            self.home_margin_sum += margin;
        } else {
            self.away_games += 1;
            self.away_margin_sum += margin;
        }

        if self.last10_margins.len() == RECENT_WINDOW {
            self.last10_margins.pop_front();
        }
        self.last10_margins.push_back(margin);

        self.last_game_date = Some(game_date);
    }

    /// Wins over games played, 0 before the first game
    pub fn win_pct(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.games_played)
    }

    pub fn avg_margin(&self) -> f64 {
        mean(self.cumulative_margin_sum, self.games_played)
    }

    pub fn home_avg_margin(&self) -> f64 {
        mean(self.home_margin_sum, self.home_games)
    }

    pub fn away_avg_margin(&self) -> f64 {
        mean(self.away_margin_sum, self.away_games)
    }

    pub fn last10_avg_margin(&self) -> f64 {
        if self.last10_margins.is_empty() {
            return 0.0;
        }
        self.last10_margins.iter().sum::<f64>() / self.last10_margins.len() as f64
    }

    /// Full days off before `game_date`; `None` for a team's first game
    ///
    /// Consecutive calendar days give 0.
    pub fn rest_days(&self, game_date: NaiveDate) -> Option<i64> {
        self.last_game_date
            .map(|last| (game_date - last).num_days() - 1)
    }

    /// Second night of a back-to-back (rest days == 0)
    pub fn is_back_to_back(&self, game_date: NaiveDate) -> bool {
        self.rest_days(game_date) == Some(0)
    }
}

fn mean(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, d).unwrap()
    }

    #[test]
    fn test_empty_state_is_neutral() {
        let state = TeamState::new();
        assert_eq!(state.win_pct(), 0.0);
        assert_eq!(state.avg_margin(), 0.0);
        assert_eq!(state.home_avg_margin(), 0.0);
        assert_eq!(state.away_avg_margin(), 0.0);
        assert_eq!(state.last10_avg_margin(), 0.0);
        assert_eq!(state.rest_days(day(1)), None);
        assert!(!state.is_back_to_back(day(1)));
    }

    #[test]
    fn test_update_tracks_splits() {
        let mut state = TeamState::new();
        state.update(110, 100, true, day(1));
        state.update(95, 101, false, day(3));

        assert_eq!(state.games_played, 2);
        assert_eq!(state.wins + state.losses, state.games_played);
        assert_eq!(state.win_pct(), 0.5);
        assert_eq!(state.avg_margin(), 2.0);
        assert_eq!(state.home_avg_margin(), 10.0);
        assert_eq!(state.away_avg_margin(), -6.0);
        assert_eq!(state.last_game_date, Some(day(3)));
    }

    #[test]
    fn test_last10_evicts_oldest() {
        let mut state = TeamState::new();
        for i in 0..11 {
            state.update(100 + i, 100, true, day(1 + i as u32));
        }

        assert_eq!(state.last10_margins.len(), RECENT_WINDOW);
        assert_eq!(state.last10_margins.front(), Some(&1.0));
        assert_eq!(state.last10_avg_margin(), 5.5);
    }

    #[test]
    fn test_rest_days_and_back_to_back() {
        let mut state = TeamState::new();
        state.update(100, 90, true, day(10));

        assert_eq!(state.rest_days(day(11)), Some(0));
        assert!(state.is_back_to_back(day(11)));
        assert_eq!(state.rest_days(day(13)), Some(2));
        assert!(!state.is_back_to_back(day(13)));
    }
}
