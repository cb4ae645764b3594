use serde::{Deserialize, Serialize};
use tracing::debug;

use super::calibration::MarginDistribution;
use super::odds::expected_value;
use crate::error::Result;
use crate::models::{
    BetCandidate, BetRecommendation, BetSelection, ConfidenceTier, ConsensusOdds, GameId, Side,
};

/// Minimum EV and probability a best bet must reach for a tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierRule {
    pub min_ev: f64,
    pub min_probability: f64,
}

impl TierRule {
    fn matches(&self, candidate: &BetCandidate) -> bool {
        candidate.expected_value >= self.min_ev && candidate.probability >= self.min_probability
    }
}

/// Selector thresholds and the spread guardrail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectorConfig {
    /// Spread candidates with |line| above this are not priced
    pub max_spread: f64,
    pub high: TierRule,
    pub medium: TierRule,
    /// Its probability also serves as the actionability floor
    pub low: TierRule,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_spread: 14.0,
            high: TierRule {
                min_ev: 0.06,
                min_probability: 0.60,
            },
            medium: TierRule {
                min_ev: 0.03,
                min_probability: 0.57,
            },
            low: TierRule {
                min_ev: 0.0,
                min_probability: 0.52,
            },
        }
    }
}

impl SelectorConfig {
    /// First matching rule wins, HIGH before MEDIUM before LOW
    pub fn classify(&self, candidate: &BetCandidate) -> ConfidenceTier {
        if self.high.matches(candidate) {
            ConfidenceTier::High
        } else if self.medium.matches(candidate) {
            ConfidenceTier::Medium
        } else if self.low.matches(candidate) {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::NoBet
        }
    }
}

/// Price every available bet for a game and pick the one to recommend
pub fn select_best_bet(
    game_id: GameId,
    predicted_margin: f64,
    sigma: f64,
    odds: Option<&ConsensusOdds>,
    config: &SelectorConfig,
) -> Result<BetRecommendation> {
    let dist = MarginDistribution::new(predicted_margin, sigma)?;

    let mut recommendation = BetRecommendation {
        game_id,
        predicted_margin,
        sigma,
        consensus_odds: odds.cloned(),
        best_bet: None,
        best_overall: None,
        candidates: Vec::new(),
        confidence_tier: ConfidenceTier::NoOdds,
    };

    let Some(odds) = odds.filter(|o| o.has_side_markets()) else {
        return Ok(recommendation);
    };

    let candidates = build_candidates(&dist, odds, config.max_spread);
    if candidates.is_empty() {
        // Only over-wide spreads posted: nothing priceable yet
        debug!("Game {}: every posted line is past the spread guardrail", game_id);
        return Ok(recommendation);
    }

    let best_overall = max_by_ev(candidates.iter());
    let best_bet = max_by_ev(
        candidates
            .iter()
            .filter(|c| c.probability >= config.low.min_probability),
    );

    recommendation.confidence_tier = match &best_bet {
        Some(bet) => config.classify(bet),
        None => ConfidenceTier::NoBet,
    };

    debug!(
        "Game {}: margin {:+.2}, {} candidates, tier {}",
        game_id,
        predicted_margin,
        candidates.len(),
        recommendation.confidence_tier
    );

    recommendation.best_overall = best_overall;
    recommendation.best_bet = best_bet;
    recommendation.candidates = candidates;

    Ok(recommendation)
}

/// Home ML, away ML, home spread, away spread, in that order
fn build_candidates(
    dist: &MarginDistribution,
    odds: &ConsensusOdds,
    max_spread: f64,
) -> Vec<BetCandidate> {
    let mut candidates = Vec::with_capacity(4);

    if let Some(ml) = &odds.moneyline {
        candidates.push(priced(
            BetSelection::Moneyline { side: Side::Home },
            ml.home_odds,
            dist.home_win(),
        ));
        candidates.push(priced(
            BetSelection::Moneyline { side: Side::Away },
            ml.away_odds,
            dist.away_win(),
        ));
    }

    if let Some(spread) = &odds.spread {
        if spread.home_line.abs() <= max_spread {
            candidates.push(priced(
                BetSelection::Spread {
                    side: Side::Home,
                    line: spread.home_line,
                },
                spread.home_odds,
                dist.home_cover(spread.home_line),
            ));
        }
        if spread.away_line.abs() <= max_spread {
            candidates.push(priced(
                BetSelection::Spread {
                    side: Side::Away,
                    line: spread.away_line,
                },
                spread.away_odds,
                dist.away_cover(spread.home_line),
            ));
        }
    }

    candidates
}

fn priced(selection: BetSelection, odds: i32, probability: f64) -> BetCandidate {
    BetCandidate {
        selection,
        odds,
        probability,
        expected_value: expected_value(probability, odds),
    }
}

/// Ties keep the earliest candidate
fn max_by_ev<'a>(candidates: impl Iterator<Item = &'a BetCandidate>) -> Option<BetCandidate> {
    candidates.fold(None, |best: Option<BetCandidate>, c| match best {
        Some(b) if b.expected_value >= c.expected_value => Some(b),
        _ => Some(*c),
    })
}
