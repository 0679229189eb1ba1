pub mod classifier;
pub mod forest;
pub mod guidance;
pub mod heuristic;
pub mod models;
#[cfg(test)]
mod tests;

pub use classifier::{mode, RiskClassifier};
pub use forest::{ForestConfig, RandomForest};
pub use guidance::guidance;
pub use heuristic::{heuristic_label, heuristic_score};
pub use models::*;
