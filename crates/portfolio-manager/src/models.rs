use analysis_core::PricedHolding;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Holdings resolved against market prices.
///
/// `total_value` is exactly the sum of `holdings[i].value`; tickers that could not be
/// priced are listed in `excluded` and take no further part in the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub holdings: Vec<PricedHolding>,
    pub total_value: f64,
    pub excluded: Vec<String>,
}

/// Portfolio-level statistics, rebuilt wholesale on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub holdings_count: usize,
    pub weighted_daily_change_pct: Option<f64>,
    /// Value-weighted short-term volatility (fraction, not annualized)
    pub weighted_volatility: Option<f64>,
    pub weighted_dividend_yield_pct: Option<f64>,
    /// Sector -> summed position value
    pub sector_breakdown: BTreeMap<String, f64>,
    pub sector_count: usize,
    /// Region label -> percent of invested value, or the reason it is unavailable
    pub region_breakdown: Result<BTreeMap<String, f64>, String>,
    /// Ticker -> percent of total value
    pub allocation: BTreeMap<String, f64>,
    pub top_holding: Option<String>,
}

/// One day of the portfolio vs benchmark chart, both normalized to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub portfolio: f64,
    pub benchmark: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHistory {
    pub benchmark_symbol: String,
    pub points: Vec<HistoryPoint>,
}

impl PortfolioHistory {
    pub fn empty(benchmark_symbol: &str) -> Self {
        Self {
            benchmark_symbol: benchmark_symbol.to_string(),
            points: Vec::new(),
        }
    }

    /// Portfolio and benchmark change over the window, in percent
    pub fn relative_performance(&self) -> Option<(f64, f64)> {
        let last = self.points.last()?;
        let bench = last.benchmark?;
        Some(((last.portfolio - 1.0) * 100.0, (bench - 1.0) * 100.0))
    }
}
