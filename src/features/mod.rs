pub mod dataset;
pub mod snapshot;
pub mod team_state;

pub use dataset::{
    build_dataset, DatasetBuilder, FeatureRow, FeatureSource, MatchupFeatures, FEATURE_COLUMNS,
    FIRST_GAME_REST_DAYS, TARGET_COLUMN,
};
pub use snapshot::GameSnapshot;
pub use team_state::TeamState;
