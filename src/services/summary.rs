use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{BetMarket, BetRecommendation, ConfidenceTier, Side};

/// Aggregate view of a batch of recommendations
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RecommendationSummary {
    pub total_games: usize,
    pub games_with_odds: usize,

    /// Every tier is present, possibly at zero
    pub tier_counts: BTreeMap<ConfidenceTier, usize>,

    /// HIGH + MEDIUM
    pub actionable: usize,
    pub moneyline_bets: usize,
    pub spread_bets: usize,
    pub home_bets: usize,
    pub away_bets: usize,

    /// Averages over actionable best bets; zero when there are none
    pub avg_expected_value: f64,
    pub avg_probability: f64,
}

impl RecommendationSummary {
    pub fn from_recommendations<'a>(
        recommendations: impl IntoIterator<Item = &'a BetRecommendation>,
    ) -> Self {
        let mut summary = Self {
            tier_counts: ConfidenceTier::ALL.iter().map(|t| (*t, 0)).collect(),
            ..Default::default()
        };

        let mut ev_sum = 0.0;
        let mut prob_sum = 0.0;

        for rec in recommendations {
            summary.total_games += 1;
            *summary
                .tier_counts
                .entry(rec.confidence_tier)
                .or_default() += 1;

            if rec.confidence_tier != ConfidenceTier::NoOdds {
                summary.games_with_odds += 1;
            }

            let Some(bet) = rec.best_bet.filter(|_| rec.is_actionable()) else {
                continue;
            };

            summary.actionable += 1;
            match bet.selection.market() {
                BetMarket::Moneyline => summary.moneyline_bets += 1,
                BetMarket::Spread => summary.spread_bets += 1,
            }
            match bet.selection.side() {
                Side::Home => summary.home_bets += 1,
                Side::Away => summary.away_bets += 1,
            }
            ev_sum += bet.expected_value;
            prob_sum += bet.probability;
        }

        if summary.actionable > 0 {
            summary.avg_expected_value = ev_sum / summary.actionable as f64;
            summary.avg_probability = prob_sum / summary.actionable as f64;
        }

        summary
    }

    pub fn count(&self, tier: ConfidenceTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }
}
