use async_trait::async_trait;
use std::sync::Arc;

use crate::{AnalysisError, Fundamentals, HistoricalSeries, HistoryPeriod};

/// Source of market data for a single ticker.
///
/// Every lookup is fallible per ticker. Callers absorb failures locally and keep
/// processing the remaining tickers.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Current market price
    async fn lookup_price(&self, ticker: &str) -> Result<f64, AnalysisError>;

    /// Daily closes over the requested window
    async fn lookup_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<HistoricalSeries, AnalysisError>;

    /// Reference data (sector, exchange, beta, valuation ratios...)
    async fn lookup_fundamentals(&self, ticker: &str) -> Result<Fundamentals, AnalysisError>;

    /// Units of USD per one unit of `currency`
    async fn lookup_fx_rate(&self, currency: &str) -> Result<f64, AnalysisError> {
        if currency.eq_ignore_ascii_case("USD") {
            Ok(1.0)
        } else {
            Err(AnalysisError::fetch(currency, "FX rates are not available from this gateway"))
        }
    }
}

#[async_trait]
impl<G: MarketDataGateway + ?Sized> MarketDataGateway for Arc<G> {
    async fn lookup_price(&self, ticker: &str) -> Result<f64, AnalysisError> {
        (**self).lookup_price(ticker).await
    }

    async fn lookup_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<HistoricalSeries, AnalysisError> {
        (**self).lookup_history(ticker, period).await
    }

    async fn lookup_fundamentals(&self, ticker: &str) -> Result<Fundamentals, AnalysisError> {
        (**self).lookup_fundamentals(ticker).await
    }

    async fn lookup_fx_rate(&self, currency: &str) -> Result<f64, AnalysisError> {
        (**self).lookup_fx_rate(currency).await
    }
}
