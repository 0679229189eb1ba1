use analysis_core::RiskLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column names of the classifier feature matrix, in row order
pub const FEATURE_NAMES: [&str; 5] = [
    "Volatility",
    "Beta",
    "P/E Ratio",
    "Dividend Yield",
    "Price Std Dev",
];

/// Raw risk inputs for one ticker; any metric may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInput {
    pub ticker: String,
    /// Annualized rolling volatility (fraction)
    pub volatility: Option<f64>,
    pub beta: Option<f64>,
    pub pe_ratio: Option<f64>,
    /// Dividend yield in percent; a missing upstream yield counts as 0
    pub dividend_yield_pct: f64,
    pub price_stddev: Option<f64>,
}

/// Complete feature row of one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub ticker: String,
    pub volatility: f64,
    pub beta: f64,
    pub pe_ratio: f64,
    pub dividend_yield_pct: f64,
    pub price_stddev: f64,
}

impl RiskFeatures {
    /// `None` when any feature is missing or not finite
    pub fn from_input(input: &RiskInput) -> Option<Self> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(Self {
            ticker: input.ticker.clone(),
            volatility: finite(input.volatility)?,
            beta: finite(input.beta)?,
            pe_ratio: finite(input.pe_ratio)?,
            dividend_yield_pct: finite(Some(input.dividend_yield_pct))?,
            price_stddev: finite(input.price_stddev)?,
        })
    }

    pub fn row(&self) -> Vec<f64> {
        vec![
            self.volatility,
            self.beta,
            self.pe_ratio,
            self.dividend_yield_pct,
            self.price_stddev,
        ]
    }
}

/// Heuristic and model labels for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub features: RiskFeatures,
    pub heuristic: RiskLabel,
    pub predicted: RiskLabel,
}

impl RiskAssessment {
    pub fn ticker(&self) -> &str {
        &self.features.ticker
    }
}

/// Advice for moving the portfolio toward the declared target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Guidance {
    Aligned {
        message: String,
    },
    Misaligned {
        warning: String,
        recommendations: Vec<String>,
    },
}

impl Guidance {
    pub fn is_aligned(&self) -> bool {
        matches!(self, Guidance::Aligned { .. })
    }
}

/// Simple (unweighted) means over the classified tickers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureAverages {
    pub volatility: f64,
    pub beta: f64,
    pub pe_ratio: f64,
    pub dividend_yield_pct: f64,
}

/// Portfolio risk classification.
///
/// Labels are fitted and predicted on the same rows: the predicted label describes
/// the portfolio, it is not an out-of-sample forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRiskReport {
    pub portfolio_label: RiskLabel,
    pub target: RiskLabel,
    pub guidance: Guidance,
    pub assessments: Vec<RiskAssessment>,
    /// Tickers left out for missing features
    pub dropped: Vec<String>,
    pub averages: FeatureAverages,
    /// Predicted label -> number of tickers
    pub composition: BTreeMap<RiskLabel, usize>,
    /// Up to three predicted-Low tickers, lowest volatility first
    pub safest: Vec<String>,
    /// Up to three predicted-High tickers, highest volatility first
    pub riskiest: Vec<String>,
}
