pub mod algorithms;
pub mod pipeline;

pub use algorithms::isolation_forest::{
    fit_score, ForestScores, IsolationForest, IsolationForestParams,
};
pub use pipeline::features::FeatureDeriver;
pub use pipeline::matrix::FeatureMatrix;
pub use pipeline::metrics::RunMetrics;
pub use pipeline::scaler::StandardScaler;
pub use pipeline::{DualAnomalyReport, DualPipeline};
