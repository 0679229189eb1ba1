use analysis_core::{HistoricalSeries, HistoryPeriod, MarketDataGateway};
use chrono::NaiveDate;
use portfolio_manager::Valuation;
use serde::Serialize;
use std::collections::BTreeMap;
use technical_analysis::{max_drawdown, normalized, period_return, rolling_volatility};

use crate::pipeline::PortfolioPipeline;

pub const DEFAULT_BENCHMARK: &str = "^GSPC";

/// Return columns of the performance table: label and calendar-day lookback
pub const RETURN_LOOKBACKS: [(&str, u32); 4] = [("1M", 30), ("6M", 180), ("1Y", 365), ("5Y", 1825)];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnsRow {
    pub ticker: String,
    /// Percent return per lookback label, rounded to 2 decimals; undefined ones are absent
    pub returns: BTreeMap<String, f64>,
    pub max_drawdown_pct: Option<f64>,
}

/// Price performance of the holdings since a start date, in USD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub start: NaiveDate,
    pub prices: BTreeMap<String, HistoricalSeries>,
    /// USD per unit of each ticker's trading currency (1.0 when unknown)
    pub fx_factors: BTreeMap<String, f64>,
    pub normalized: BTreeMap<String, Vec<(NaiveDate, f64)>>,
    pub returns: Vec<ReturnsRow>,
    pub benchmarks: BTreeMap<String, Vec<(NaiveDate, f64)>>,
    /// 30 day rolling volatility in percent
    pub rolling_volatility: BTreeMap<String, Vec<(NaiveDate, f64)>>,
    /// Tickers and benchmarks without any price data since `start`
    pub missing: Vec<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<G: MarketDataGateway> PortfolioPipeline<G> {
    pub async fn performance(
        &self,
        valuation: &Valuation,
        start: NaiveDate,
        benchmarks: &[String],
    ) -> PerformanceReport {
        let period = HistoryPeriod::Since(start);
        let mut report = PerformanceReport {
            start,
            prices: BTreeMap::new(),
            fx_factors: BTreeMap::new(),
            normalized: BTreeMap::new(),
            returns: Vec::new(),
            benchmarks: BTreeMap::new(),
            rolling_volatility: BTreeMap::new(),
            missing: Vec::new(),
        };

        for ticker in valuation.tickers() {
            let series = self.data.history(&ticker, period).await;
            if series.is_empty() {
                report.missing.push(ticker);
                continue;
            }

            let factor = self.usd_factor(&ticker).await;
            let usd = series.scaled(factor);

            report.returns.push(ReturnsRow {
                ticker: ticker.clone(),
                returns: RETURN_LOOKBACKS
                    .iter()
                    .filter_map(|(label, days)| {
                        period_return(&usd, *days).map(|r| (label.to_string(), round2(r)))
                    })
                    .collect(),
                max_drawdown_pct: max_drawdown(&usd, usd.len()).map(round2),
            });
            report.normalized.insert(ticker.clone(), normalized(&usd));
            report.rolling_volatility.insert(
                ticker.clone(),
                rolling_volatility(&usd, self.config.volatility_window),
            );
            report.fx_factors.insert(ticker.clone(), factor);
            report.prices.insert(ticker, usd);
        }

        for symbol in benchmarks {
            let series = self.data.history(symbol, period).await;
            let rebased = normalized(&series);
            if rebased.is_empty() {
                report.missing.push(symbol.clone());
            } else {
                report.benchmarks.insert(symbol.clone(), rebased);
            }
        }

        tracing::info!(
            "Performance since {}: {} tickers, {} benchmarks, {} without data",
            start,
            report.prices.len(),
            report.benchmarks.len(),
            report.missing.len()
        );
        report
    }

    /// USD conversion factor for a ticker's trading currency; 1.0 when unknown.
    async fn usd_factor(&self, ticker: &str) -> f64 {
        let currency = self
            .data
            .fundamentals(ticker)
            .await
            .currency
            .unwrap_or_else(|| "USD".to_string());
        if currency.eq_ignore_ascii_case("USD") {
            return 1.0;
        }
        self.data.fx_rate(&currency).await.unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(-4.994), -4.99);
        assert_eq!(round2(0.0), 0.0);
    }
}
