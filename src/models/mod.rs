pub mod bet;
pub mod game;
pub mod odds;

pub use bet::{BetCandidate, BetMarket, BetRecommendation, BetSelection, ConfidenceTier, Side};
pub use game::{CompletedGame, Game, GameId, Team, TeamId};
pub use odds::{BookOdds, ConsensusOdds, MoneylineMarket, SpreadMarket, TotalMarket};
