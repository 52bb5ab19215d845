//! Park ranking
//!
//! Distance estimation, the composite candidate score and the pipeline that
//! folds catalog, weather, elevation and routes into a ranked result.

pub mod distance;
pub mod pipeline;
pub mod scorer;

pub use distance::distance_km;
pub use pipeline::{RankQuery, RankingPipeline, RankingSettings, best_candidate};
pub use scorer::{ScoringWeights, score};
