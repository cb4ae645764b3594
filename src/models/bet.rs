use std::fmt;

use serde::{Deserialize, Serialize};

use super::game::GameId;
use super::odds::ConsensusOdds;

/// Which team a bet backs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

/// Market a bet is placed in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BetMarket {
    Moneyline,
    Spread,
}

impl BetMarket {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetMarket::Moneyline => "moneyline",
            BetMarket::Spread => "spread",
        }
    }
}

/// The four bet shapes evaluated per game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "bet_type", rename_all = "snake_case")]
pub enum BetSelection {
    Moneyline { side: Side },
    /// `line` is from the backed side's perspective (home -6.5 / away +6.5)
    Spread { side: Side, line: f64 },
}

impl BetSelection {
    pub fn side(&self) -> Side {
        match self {
            BetSelection::Moneyline { side } | BetSelection::Spread { side, .. } => *side,
        }
    }

    pub fn market(&self) -> BetMarket {
        match self {
            BetSelection::Moneyline { .. } => BetMarket::Moneyline,
            BetSelection::Spread { .. } => BetMarket::Spread,
        }
    }

    /// Spread line, absent for moneyline bets
    pub fn line(&self) -> Option<f64> {
        match self {
            BetSelection::Moneyline { .. } => None,
            BetSelection::Spread { line, .. } => Some(*line),
        }
    }
}

/// A priced bet with the model's probability of winning it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BetCandidate {
    pub selection: BetSelection,

    /// American odds
    pub odds: i32,

    /// Model probability the bet wins, in (0, 1)
    pub probability: f64,

    /// Profit per unit staked at `probability` (may be negative)
    pub expected_value: f64,
}

impl fmt::Display for BetCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.selection.side().as_str().to_uppercase();
        match self.selection {
            BetSelection::Spread { line, .. } => write!(f, "{} {:+.1} @ {:+}", side, line, self.odds),
            BetSelection::Moneyline { .. } => write!(f, "{} ML @ {:+}", side, self.odds),
        }
    }
}

/// Actionability of a game's recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    /// EV >= 6% and probability >= 60%
    High,
    /// EV >= 3% and probability >= 57%
    Medium,
    /// EV >= 0% and probability >= 52%
    Low,
    /// Odds exist but nothing clears the guardrails
    NoBet,
    /// No side market posted yet
    NoOdds,
}

impl ConfidenceTier {
    pub const ALL: [ConfidenceTier; 5] = [
        ConfidenceTier::High,
        ConfidenceTier::Medium,
        ConfidenceTier::Low,
        ConfidenceTier::NoBet,
        ConfidenceTier::NoOdds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "HIGH",
            ConfidenceTier::Medium => "MEDIUM",
            ConfidenceTier::Low => "LOW",
            ConfidenceTier::NoBet => "NO_BET",
            ConfidenceTier::NoOdds => "NO_ODDS",
        }
    }

    /// HIGH and MEDIUM are the tiers worth acting on
    pub fn is_actionable(&self) -> bool {
        matches!(self, ConfidenceTier::High | ConfidenceTier::Medium)
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-game output of the bet selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRecommendation {
    pub game_id: GameId,

    /// Predicted home score minus away score
    pub predicted_margin: f64,

    pub sigma: f64,

    pub consensus_odds: Option<ConsensusOdds>,

    /// Best candidate clearing the probability floor
    pub best_bet: Option<BetCandidate>,

    /// Best EV candidate regardless of thresholds (lean display)
    pub best_overall: Option<BetCandidate>,

    /// Every candidate that was priced
    pub candidates: Vec<BetCandidate>,

    pub confidence_tier: ConfidenceTier,
}

impl BetRecommendation {
    pub fn has_recommendation(&self) -> bool {
        self.best_bet.is_some()
    }

    pub fn is_actionable(&self) -> bool {
        self.confidence_tier.is_actionable()
    }

    /// Side the raw prediction favors, `None` for a pick'em
    pub fn model_lean(&self) -> Option<Side> {
        if self.predicted_margin > 0.0 {
            Some(Side::Home)
        } else if self.predicted_margin < 0.0 {
            Some(Side::Away)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_display() {
        let spread = BetCandidate {
            selection: BetSelection::Spread {
                side: Side::Away,
                line: 6.5,
            },
            odds: -110,
            probability: 0.55,
            expected_value: 0.05,
        };
        assert_eq!(spread.to_string(), "AWAY +6.5 @ -110");

        let ml = BetCandidate {
            selection: BetSelection::Moneyline { side: Side::Home },
            odds: 145,
            probability: 0.45,
            expected_value: 0.1,
        };
        assert_eq!(ml.to_string(), "HOME ML @ +145");
        assert_eq!(ml.selection.line(), None);
    }

    #[test]
    fn test_tier_serializes_screaming_case() {
        let json = serde_json::to_string(&ConfidenceTier::NoOdds).unwrap();
        assert_eq!(json, "\"NO_ODDS\"");
        assert!(ConfidenceTier::Medium.is_actionable());
        assert!(!ConfidenceTier::Low.is_actionable());
    }
}
