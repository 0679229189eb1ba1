use analysis_core::{
    AnalysisError, Fundamentals, HistoricalSeries, HistoryPeriod, MarketDataGateway,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of lookups served per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub price: usize,
    pub history: usize,
    pub fundamentals: usize,
    pub fx: usize,
}

/// Deterministic in-memory gateway.
///
/// Histories are stored whole and cut to the requested period relative to `as_of`
/// (or to each series' last date when unset). Unknown tickers fail with `FetchFailed`.
#[derive(Default)]
pub struct StaticGateway {
    prices: HashMap<String, f64>,
    histories: HashMap<String, HistoricalSeries>,
    fundamentals: HashMap<String, Fundamentals>,
    fx_rates: HashMap<String, f64>,
    as_of: Option<NaiveDate>,
    price_calls: AtomicUsize,
    history_calls: AtomicUsize,
    fundamentals_calls: AtomicUsize,
    fx_calls: AtomicUsize,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, ticker: &str, price: f64) -> Self {
        self.prices.insert(ticker.to_string(), price);
        self
    }

    pub fn with_history(mut self, series: HistoricalSeries) -> Self {
        self.histories.insert(series.ticker().to_string(), series);
        self
    }

    pub fn with_fundamentals(mut self, ticker: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(ticker.to_string(), fundamentals);
        self
    }

    pub fn with_fx_rate(mut self, currency: &str, rate: f64) -> Self {
        self.fx_rates.insert(currency.to_string(), rate);
        self
    }

    /// Reference date for period cuts
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            price: self.price_calls.load(Ordering::SeqCst),
            history: self.history_calls.load(Ordering::SeqCst),
            fundamentals: self.fundamentals_calls.load(Ordering::SeqCst),
            fx: self.fx_calls.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl MarketDataGateway for StaticGateway {
    async fn lookup_price(&self, ticker: &str) -> Result<f64, AnalysisError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.prices
            .get(ticker)
            .copied()
            .ok_or_else(|| AnalysisError::fetch(ticker, "unknown ticker"))
    }

    async fn lookup_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<HistoricalSeries, AnalysisError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let series = self
            .histories
            .get(ticker)
            .ok_or_else(|| AnalysisError::fetch(ticker, "no history"))?;

        let anchor = match self.as_of.or_else(|| series.last().map(|p| p.date)) {
            Some(date) => date,
            None => return Ok(series.clone()),
        };
        match period.start_date(anchor) {
            Some(start) => {
                let points = series
                    .points()
                    .iter()
                    .filter(|p| p.date >= start && p.date <= anchor)
                    .copied()
                    .collect();
                HistoricalSeries::new(ticker, points)
            }
            None => Ok(series.clone()),
        }
    }

    async fn lookup_fundamentals(&self, ticker: &str) -> Result<Fundamentals, AnalysisError> {
        self.fundamentals_calls.fetch_add(1, Ordering::SeqCst);
        self.fundamentals
            .get(ticker)
            .cloned()
            .ok_or_else(|| AnalysisError::fetch(ticker, "no fundamentals"))
    }

    async fn lookup_fx_rate(&self, currency: &str) -> Result<f64, AnalysisError> {
        self.fx_calls.fetch_add(1, Ordering::SeqCst);
        if currency.eq_ignore_ascii_case("USD") {
            return Ok(1.0);
        }
        self.fx_rates
            .get(currency)
            .copied()
            .ok_or_else(|| AnalysisError::fetch(currency, "no FX rate"))
    }
}
