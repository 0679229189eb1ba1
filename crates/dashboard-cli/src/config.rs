use analysis_core::RiskLabel;
use analysis_orchestrator::{PipelineConfig, DEFAULT_BENCHMARK};
use anyhow::{Context, Result};
use report_builder::DEFAULT_ARCHIVE_NAME;
use risk_manager::ForestConfig;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    // Market data
    pub yahoo_base_url: Option<String>,
    pub yahoo_rate_limit: usize,   // requests per minute
    pub http_timeout_secs: u64,

    // Comparisons
    pub benchmark_symbols: Vec<String>,
    pub overview_benchmark: String,

    // Risk
    pub target_risk: RiskLabel,
    pub forest_trees: usize,
    pub forest_seed: u64,

    // Export
    pub export_path: String,
}

/// Comma-separated symbols, trimmed and upper-cased; blanks are skipped
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            yahoo_base_url: lookup("YAHOO_BASE_URL").filter(|s| !s.trim().is_empty()),
            yahoo_rate_limit: var("YAHOO_RATE_LIMIT", "120")
                .parse()
                .context("YAHOO_RATE_LIMIT must be a whole number")?,
            http_timeout_secs: var("HTTP_TIMEOUT_SECS", "30")
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            benchmark_symbols: parse_symbols(&var("BENCHMARK_SYMBOLS", DEFAULT_BENCHMARK)),
            overview_benchmark: var("OVERVIEW_BENCHMARK", "SPY").trim().to_uppercase(),
            target_risk: var("TARGET_RISK", "Moderate")
                .parse()
                .context("TARGET_RISK must be Low, Moderate or High")?,
            forest_trees: var("RISK_FOREST_TREES", "100")
                .parse()
                .context("RISK_FOREST_TREES must be a whole number")?,
            forest_seed: var("RISK_FOREST_SEED", "42")
                .parse()
                .context("RISK_FOREST_SEED must be a whole number")?,
            export_path: var("EXPORT_PATH", DEFAULT_ARCHIVE_NAME),
        };

        if config.forest_trees == 0 {
            anyhow::bail!("RISK_FOREST_TREES must be at least 1");
        }
        if config.yahoo_rate_limit == 0 {
            anyhow::bail!("YAHOO_RATE_LIMIT must be at least 1");
        }

        Ok(config)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            overview_benchmark: self.overview_benchmark.clone(),
            forest: ForestConfig {
                n_trees: self.forest_trees,
                seed: self.forest_seed,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
