pub mod calibration;
pub mod consensus;
pub mod odds;
pub mod selector;

pub use calibration::{normal_cdf, MarginDistribution};
pub use consensus::ConsensusResolver;
pub use odds::{american_to_decimal, expected_value, implied_probability, is_valid_american};
pub use selector::{select_best_bet, SelectorConfig, TierRule};
