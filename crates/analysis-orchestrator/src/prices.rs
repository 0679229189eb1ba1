use analysis_core::{AnalysisError, HistoryPeriod, MarketDataGateway};
use chrono::NaiveDate;
use portfolio_manager::Valuation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use technical_analysis::{distance_from_high, max_drawdown, normalized, rsi, short_term_volatility, total_return};

use crate::pipeline::PortfolioPipeline;

const NORMALIZED_HISTORY_DAYS: u32 = 90;

/// Selectable return period of the price change table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnPeriod {
    OneDay,
    OneWeek,
    #[default]
    OneMonth,
    SixMonths,
    OneYear,
    FiveYears,
    AllTime,
}

impl ReturnPeriod {
    pub const ALL: [ReturnPeriod; 7] = [
        ReturnPeriod::OneDay,
        ReturnPeriod::OneWeek,
        ReturnPeriod::OneMonth,
        ReturnPeriod::SixMonths,
        ReturnPeriod::OneYear,
        ReturnPeriod::FiveYears,
        ReturnPeriod::AllTime,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReturnPeriod::OneDay => "1 Day",
            ReturnPeriod::OneWeek => "1 Week",
            ReturnPeriod::OneMonth => "1 Month",
            ReturnPeriod::SixMonths => "6 Months",
            ReturnPeriod::OneYear => "1 Year",
            ReturnPeriod::FiveYears => "5 Years",
            ReturnPeriod::AllTime => "All Time",
        }
    }

    /// History fetched for the period; the change runs from its first to its last close
    pub fn history_period(&self) -> HistoryPeriod {
        match self {
            ReturnPeriod::OneDay => HistoryPeriod::Days(2),
            ReturnPeriod::OneWeek => HistoryPeriod::Days(7),
            ReturnPeriod::OneMonth => HistoryPeriod::Days(30),
            ReturnPeriod::SixMonths => HistoryPeriod::Months(6),
            ReturnPeriod::OneYear => HistoryPeriod::Years(1),
            ReturnPeriod::FiveYears => HistoryPeriod::Years(5),
            ReturnPeriod::AllTime => HistoryPeriod::Max,
        }
    }
}

impl fmt::Display for ReturnPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReturnPeriod {
    type Err = AnalysisError;

    /// Accepts the display labels and short codes such as `1d`, `6mo`, `5y` or `max`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if let Some(p) = Self::ALL.iter().find(|p| p.label().to_ascii_lowercase() == key) {
            return Ok(*p);
        }
        match key.as_str() {
            "1d" | "2d" => Ok(ReturnPeriod::OneDay),
            "1w" | "7d" => Ok(ReturnPeriod::OneWeek),
            "1m" | "1mo" | "30d" => Ok(ReturnPeriod::OneMonth),
            "6m" | "6mo" => Ok(ReturnPeriod::SixMonths),
            "1y" => Ok(ReturnPeriod::OneYear),
            "5y" => Ok(ReturnPeriod::FiveYears),
            "max" | "all" => Ok(ReturnPeriod::AllTime),
            _ => Err(AnalysisError::InvalidData(format!("unknown return period '{}'", s))),
        }
    }
}

/// Price and risk columns of one ticker. Percent values; `None` where undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeRow {
    pub ticker: String,
    pub price: f64,
    pub one_day_pct: Option<f64>,
    pub one_week_pct: Option<f64>,
    pub one_month_pct: Option<f64>,
    pub volatility_30d_pct: Option<f64>,
    pub max_drawdown_90d_pct: Option<f64>,
    pub from_52w_high_pct: Option<f64>,
    pub rsi: Option<f64>,
    pub selected_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChanges {
    pub period: ReturnPeriod,
    pub rows: Vec<PriceChangeRow>,
    /// Last 90 days per ticker, rebased to 100
    pub normalized_history: BTreeMap<String, Vec<(NaiveDate, f64)>>,
}

impl<G: MarketDataGateway> PortfolioPipeline<G> {
    /// Price change table for every priced ticker plus the selected period column
    pub async fn price_changes(&self, valuation: &Valuation, period: ReturnPeriod) -> PriceChanges {
        let cfg = &self.config;
        let mut rows = Vec::new();
        let mut normalized_history = BTreeMap::new();

        for ticker in valuation.tickers() {
            let price = valuation
                .holdings
                .iter()
                .find(|h| h.ticker() == ticker)
                .map_or(0.0, |h| h.price);

            let one_day_pct = self.period_change(&ticker, ReturnPeriod::OneDay).await;
            let one_week_pct = self.period_change(&ticker, ReturnPeriod::OneWeek).await;
            let one_month_pct = self.period_change(&ticker, ReturnPeriod::OneMonth).await;
            let selected_pct = self.period_change(&ticker, period).await;

            let short = self
                .data
                .history(&ticker, HistoryPeriod::Days(cfg.volatility_window as u32))
                .await;
            let recent = self
                .data
                .history(&ticker, HistoryPeriod::Days(NORMALIZED_HISTORY_DAYS))
                .await;
            let high = self.data.fundamentals(&ticker).await.fifty_two_week_high;

            let rebased = normalized(&recent);
            if !rebased.is_empty() {
                normalized_history.insert(ticker.clone(), rebased);
            }

            rows.push(PriceChangeRow {
                price,
                one_day_pct,
                one_week_pct,
                one_month_pct,
                volatility_30d_pct: short_term_volatility(&short, cfg.volatility_window)
                    .map(|v| v * 100.0),
                max_drawdown_90d_pct: max_drawdown(&recent, cfg.drawdown_window),
                from_52w_high_pct: distance_from_high(price, high),
                rsi: rsi(&recent, cfg.rsi_window),
                selected_pct,
                ticker,
            });
        }

        PriceChanges {
            period,
            rows,
            normalized_history,
        }
    }

    async fn period_change(&self, ticker: &str, period: ReturnPeriod) -> Option<f64> {
        total_return(&self.data.history(ticker, period.history_period()).await)
    }
}
