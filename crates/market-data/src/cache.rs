use analysis_core::{Fundamentals, HistoricalSeries, HistoryPeriod, MarketDataGateway};
use dashmap::DashMap;

/// Memoizing wrapper around a [`MarketDataGateway`].
///
/// Each operation has its own map keyed by its arguments. Lookup failures are logged,
/// absorbed into a neutral value (price 0, empty series, default fundamentals, no FX rate)
/// and memoized like any other result, so a ticker is asked for at most once per key.
/// Entries are never evicted; call [`CachedGateway::clear`] between independent sessions.
pub struct CachedGateway<G> {
    inner: G,
    prices: DashMap<String, f64>,
    histories: DashMap<(String, HistoryPeriod), HistoricalSeries>,
    fundamentals: DashMap<String, Fundamentals>,
    fx_rates: DashMap<String, Option<f64>>,
}

impl<G: MarketDataGateway> CachedGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            prices: DashMap::new(),
            histories: DashMap::new(),
            fundamentals: DashMap::new(),
            fx_rates: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Current price, 0 when the ticker cannot be priced
    pub async fn price(&self, ticker: &str) -> f64 {
        if let Some(price) = self.prices.get(ticker).map(|r| *r.value()) {
            tracing::debug!("Cache hit: price {}", ticker);
            return price;
        }

        let price = match self.inner.lookup_price(ticker).await {
            Ok(p) if p.is_finite() && p > 0.0 => p,
            Ok(p) => {
                tracing::warn!("Unusable price {} for {}, treating as unpriced", p, ticker);
                0.0
            }
            Err(e) => {
                tracing::warn!("Price lookup failed for {}: {}", ticker, e);
                0.0
            }
        };
        self.prices.insert(ticker.to_string(), price);
        price
    }

    /// Daily closes over `period`, empty when the lookup fails
    pub async fn history(&self, ticker: &str, period: HistoryPeriod) -> HistoricalSeries {
        let key = (ticker.to_string(), period);
        if let Some(series) = self.histories.get(&key).map(|r| r.value().clone()) {
            tracing::debug!("Cache hit: history {} {}", ticker, period);
            return series;
        }

        let series = match self.inner.lookup_history(ticker, period).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("History lookup failed for {} ({}): {}", ticker, period, e);
                HistoricalSeries::empty(ticker)
            }
        };
        self.histories.insert(key, series.clone());
        series
    }

    /// Reference data, all fields missing when the lookup fails
    pub async fn fundamentals(&self, ticker: &str) -> Fundamentals {
        if let Some(f) = self.fundamentals.get(ticker).map(|r| r.value().clone()) {
            tracing::debug!("Cache hit: fundamentals {}", ticker);
            return f;
        }

        let fundamentals = match self.inner.lookup_fundamentals(ticker).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Fundamentals lookup failed for {}: {}", ticker, e);
                Fundamentals::default()
            }
        };
        self.fundamentals.insert(ticker.to_string(), fundamentals.clone());
        fundamentals
    }

    /// USD per unit of `currency`, `None` when no rate is available
    pub async fn fx_rate(&self, currency: &str) -> Option<f64> {
        if let Some(rate) = self.fx_rates.get(currency).map(|r| *r.value()) {
            tracing::debug!("Cache hit: fx {}", currency);
            return rate;
        }

        let rate = match self.inner.lookup_fx_rate(currency).await {
            Ok(r) if r.is_finite() && r > 0.0 => Some(r),
            Ok(r) => {
                tracing::warn!("Unusable FX rate {} for {}", r, currency);
                None
            }
            Err(e) => {
                tracing::warn!("FX lookup failed for {}: {}", currency, e);
                None
            }
        };
        self.fx_rates.insert(currency.to_string(), rate);
        rate
    }

    /// Number of memoized entries across all operations
    pub fn len(&self) -> usize {
        self.prices.len() + self.histories.len() + self.fundamentals.len() + self.fx_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.prices.clear();
        self.histories.clear();
        self.fundamentals.clear();
        self.fx_rates.clear();
    }
}
