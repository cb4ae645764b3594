pub mod recommendation;
pub mod summary;
pub mod training;

pub use recommendation::{GameRecommendation, InferenceCache, RecommendationService};
pub use summary::RecommendationSummary;
pub use training::{fit_model, train_from_store, TrainingRun};
