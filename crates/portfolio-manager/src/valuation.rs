use analysis_core::{AnalysisError, Holding, PricedHolding, Quote};
use std::collections::BTreeMap;

use crate::aggregation::group_sum;
use crate::models::Valuation;

/// Price each holding and total the portfolio.
///
/// Holdings whose quote is missing or not positive are excluded; they never reach
/// totals or weights.
pub fn value_holdings(
    holdings: &[Holding],
    quotes: &BTreeMap<String, Quote>,
) -> Result<Valuation, AnalysisError> {
    if holdings.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    if let Some(bad) = holdings.iter().find(|h| !h.is_valid()) {
        return Err(AnalysisError::InvalidData(format!(
            "invalid holding '{}' x {}",
            bad.ticker, bad.quantity
        )));
    }

    let mut priced = Vec::with_capacity(holdings.len());
    let mut excluded = Vec::new();

    for holding in holdings {
        let quote = quotes.get(&holding.ticker).copied().unwrap_or_default();
        if !(quote.price.is_finite() && quote.price > 0.0) {
            tracing::warn!("No usable price for {}, excluding it from valuation", holding.ticker);
            excluded.push(holding.ticker.clone());
            continue;
        }
        priced.push(PricedHolding {
            holding: holding.clone(),
            price: quote.price,
            previous_close: quote.previous_close,
            value: quote.price * holding.quantity,
        });
    }

    let total_value = priced.iter().map(|h| h.value).sum();

    Ok(Valuation {
        holdings: priced,
        total_value,
        excluded,
    })
}

impl Valuation {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Unique tickers in first-appearance order
    pub fn tickers(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for h in &self.holdings {
            if !seen.iter().any(|t| t == h.ticker()) {
                seen.push(h.ticker().to_string());
            }
        }
        seen
    }

    /// Position values, used as aggregation weights
    pub fn weights(&self) -> Vec<f64> {
        self.holdings.iter().map(|h| h.value).collect()
    }

    /// Ticker -> percent of total value. Repeated tickers are combined.
    pub fn allocation(&self) -> BTreeMap<String, f64> {
        if self.total_value <= 0.0 {
            return BTreeMap::new();
        }
        let total = self.total_value;
        group_sum(&self.holdings, |h| h.ticker().to_string(), |h| h.value / total * 100.0)
    }

    /// Holding with the largest value; the first one wins ties
    pub fn top_holding(&self) -> Option<&PricedHolding> {
        let mut top: Option<&PricedHolding> = None;
        for h in &self.holdings {
            match top {
                Some(t) if h.value <= t.value => {}
                _ => top = Some(h),
            }
        }
        top
    }

    /// Summed quantity per ticker
    pub fn quantities(&self) -> BTreeMap<String, f64> {
        group_sum(&self.holdings, |h| h.ticker().to_string(), |h| h.quantity())
    }
}
