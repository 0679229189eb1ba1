//! Scalar and dated metrics over a single [`HistoricalSeries`].
//!
//! Every function is pure in its series argument. A metric that cannot be computed
//! from the available history is `None`, never zero, so that portfolio aggregates
//! leave it out.

use analysis_core::HistoricalSeries;
use chrono::{Duration, NaiveDate};
use statrs::statistics::Statistics;

use crate::indicators::{daily_returns, rolling_std, rsi_values};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_VOLATILITY_WINDOW: usize = 30;
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// Percent return from the earliest observation on or after `last_date - lookback_days`
/// to the last observation.
pub fn period_return(series: &HistoricalSeries, lookback_days: u32) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let last = series.last()?;
    let bound = last.date - Duration::days(i64::from(lookback_days));
    let anchor = series.points().iter().find(|p| p.date >= bound)?;
    if anchor.close <= 0.0 {
        return None;
    }
    Some((last.close - anchor.close) / anchor.close * 100.0)
}

/// Percent change from the first to the last observation
pub fn total_return(series: &HistoricalSeries) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first()?.close;
    let last = series.last()?.close;
    if first <= 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Population standard deviation of the trailing `window` daily changes.
/// Short-term risk metric; not annualized.
pub fn short_term_volatility(series: &HistoricalSeries, window: usize) -> Option<f64> {
    let returns = daily_returns(&series.closes());
    let tail = &returns[returns.len().saturating_sub(window)..];
    if tail.len() < 2 {
        return None;
    }
    Some(tail.iter().population_std_dev())
}

/// Mean of the rolling `window` standard deviations of daily changes, annualized.
/// Used as the volatility risk feature.
pub fn annualized_volatility(series: &HistoricalSeries, window: usize) -> Option<f64> {
    let returns = daily_returns(&series.closes());
    let rolling = rolling_std(&returns, window);
    if rolling.is_empty() {
        return None;
    }
    Some(rolling.iter().mean() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Dated rolling `window` volatility of daily changes, in percent
pub fn rolling_volatility(series: &HistoricalSeries, window: usize) -> Vec<(NaiveDate, f64)> {
    let returns = daily_returns(&series.closes());
    let rolling = rolling_std(&returns, window);
    zip_tail(series, rolling.into_iter().map(|v| v * 100.0).collect())
}

/// Deepest decline from the running peak within the trailing `window` observations,
/// in percent (always <= 0).
pub fn max_drawdown(series: &HistoricalSeries, window: usize) -> Option<f64> {
    let tail = series.tail(window);
    let mut peak = tail.first()?.close;
    let mut worst = 0.0_f64;
    for p in tail {
        if p.close > peak {
            peak = p.close;
        }
        if peak > 0.0 {
            let dd = (p.close - peak) / peak * 100.0;
            if dd < worst {
                worst = dd;
            }
        }
    }
    Some(worst)
}

/// Latest relative strength index over the trailing `window` changes (0-100)
pub fn rsi(series: &HistoricalSeries, window: usize) -> Option<f64> {
    rsi_values(&series.closes(), window).last().copied()
}

/// Dated RSI column
pub fn rsi_series(series: &HistoricalSeries, window: usize) -> Vec<(NaiveDate, f64)> {
    zip_tail(series, rsi_values(&series.closes(), window))
}

/// Percent distance of `price` below (negative) or above its 52-week high
pub fn distance_from_high(price: f64, high: Option<f64>) -> Option<f64> {
    let high = high.filter(|h| *h > 0.0)?;
    Some((price - high) / high * 100.0)
}

/// Sample standard deviation of closes
pub fn price_std_dev(series: &HistoricalSeries) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    Some(series.points().iter().map(|p| p.close).std_dev())
}

/// Series rebased to 100 at its first observation
pub fn normalized(series: &HistoricalSeries) -> Vec<(NaiveDate, f64)> {
    let base = match series.first() {
        Some(p) if p.close > 0.0 => p.close,
        _ => return Vec::new(),
    };
    series
        .points()
        .iter()
        .map(|p| (p.date, p.close / base * 100.0))
        .collect()
}

/// Pair indicator output with the dates it ends on (right-aligned).
fn zip_tail(series: &HistoricalSeries, values: Vec<f64>) -> Vec<(NaiveDate, f64)> {
    let tail = series.tail(values.len());
    tail.iter()
        .zip(values[values.len() - tail.len()..].iter())
        .map(|(p, v)| (p.date, *v))
        .collect()
}
