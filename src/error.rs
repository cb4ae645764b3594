use thiserror::Error;

/// Errors raised by the prediction-to-recommendation pipeline.
///
/// Data sparsity (a team with no prior games, a game with no odds) is never
/// reported here; those cases have defined neutral values.
#[derive(Error, Debug)]
pub enum Error {
    /// A game record failed boundary validation.
    #[error("invalid game {game_id}: {reason}")]
    InvalidGame { game_id: i64, reason: String },

    /// Probability calibration needs a strictly positive, finite sigma.
    #[error("sigma must be positive and finite, got {0}")]
    InvalidSigma(f64),

    /// American odds must be <= -100 or >= +100
    #[error("invalid American odds {odds} from {book}")]
    InvalidOdds { book: String, odds: i32 },

    /// A feature column the model was trained on is missing from the input.
    #[error("missing feature column: {0}")]
    MissingFeature(String),

    /// The persisted artifact was trained on a different column layout.
    #[error("model artifact columns {found:?} do not match expected {expected:?}")]
    ModelArtifactMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Season split would let later seasons train earlier ones.
    #[error("invalid split policy: {0}")]
    InvalidSplitPolicy(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Normal equations could not be solved.
    #[error("singular system in ridge solve")]
    SingularSystem,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
