use risk_manager::ForestConfig;
use serde::{Deserialize, Serialize};

/// Analysis windows and lookbacks used by [`crate::PortfolioPipeline`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Trailing daily changes behind the short-term volatility (also the rolling window
    /// of the annualized risk feature)
    pub volatility_window: usize,
    /// Trailing observations behind the max drawdown column
    pub drawdown_window: usize,
    pub rsi_window: usize,
    /// History behind the risk features
    pub feature_months: u32,
    /// History behind the export technicals
    pub export_years: u32,
    /// Benchmark of the overview "portfolio vs market" curve
    pub overview_benchmark: String,
    pub overview_history_days: u32,
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            volatility_window: 30,
            drawdown_window: 90,
            rsi_window: 14,
            feature_months: 6,
            export_years: 1,
            overview_benchmark: "SPY".to_string(),
            overview_history_days: 30,
            forest: ForestConfig::default(),
        }
    }
}
