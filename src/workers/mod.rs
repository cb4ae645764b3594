pub mod odds_refresher;
pub mod retrainer;

pub use odds_refresher::{OddsRefresherWorker, RefreshStats};
pub use retrainer::RetrainerWorker;
