pub mod margin;
pub mod ridge;
pub mod split;
pub mod store;

pub use margin::{train, ModelMetadata, SplitMetrics, TrainedModel, DEFAULT_ALPHAS};
pub use ridge::{RidgePipeline, StandardScaler};
pub use split::{SeasonSplit, Split, SplitPolicy};
pub use store::{ModelHandle, ModelStore};
