use analysis_core::HistoricalSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::{align, daily_returns, rolling_std, rsi_values, sma};
use crate::metrics::{DEFAULT_RSI_WINDOW, DEFAULT_VOLATILITY_WINDOW, TRADING_DAYS_PER_YEAR};

/// One trading day of indicator columns for the export workbook.
///
/// Columns are `None` until their warm-up window is filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalRow {
    pub date: NaiveDate,
    pub close: f64,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    /// Annualized rolling 30 day volatility of daily changes (fraction)
    pub volatility: Option<f64>,
    pub rsi: Option<f64>,
}

/// Per-day technical columns over a whole series
pub fn technical_rows(series: &HistoricalSeries) -> Vec<TechnicalRow> {
    let closes = series.closes();
    let n = closes.len();
    if n == 0 {
        return Vec::new();
    }

    let sma_50 = align(&sma(&closes, 50), n);
    let sma_200 = align(&sma(&closes, 200), n);

    // Returns start at the second close, so a plain right-align lines them up.
    let returns = daily_returns(&closes);
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();
    let vol: Vec<f64> = rolling_std(&returns, DEFAULT_VOLATILITY_WINDOW)
        .into_iter()
        .map(|s| s * annualizer)
        .collect();
    let volatility = align(&vol, n);
    let rsi = align(&rsi_values(&closes, DEFAULT_RSI_WINDOW), n);

    series
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| TechnicalRow {
            date: p.date,
            close: p.close,
            sma_50: sma_50[i],
            sma_200: sma_200[i],
            volatility: volatility[i],
            rsi: rsi[i],
        })
        .collect()
}
