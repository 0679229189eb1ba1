use chrono::{Duration, Months as CalendarMonths, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// One ticker + quantity entry of a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub quantity: f64,
}

impl Holding {
    /// Tickers are normalised (trimmed, upper-cased) on construction.
    pub fn new(ticker: impl AsRef<str>, quantity: f64) -> Self {
        Self {
            ticker: ticker.as_ref().trim().to_uppercase(),
            quantity,
        }
    }

    /// A holding takes part in a run only with a non-empty ticker and a positive quantity.
    pub fn is_valid(&self) -> bool {
        !self.ticker.trim().is_empty() && self.quantity.is_finite() && self.quantity > 0.0
    }
}

/// Current price snapshot for one ticker. A price of 0 means "unresolvable".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub previous_close: Option<f64>,
}

/// Holding resolved against a positive market price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedHolding {
    #[serde(flatten)]
    pub holding: Holding,
    pub price: f64,
    pub previous_close: Option<f64>,
    pub value: f64,
}

impl PricedHolding {
    pub fn ticker(&self) -> &str {
        &self.holding.ticker
    }

    pub fn quantity(&self) -> f64 {
        self.holding.quantity
    }

    /// Percent change of the current price against the previous close
    pub fn daily_change_pct(&self) -> Option<f64> {
        let prev = self.previous_close.filter(|p| *p > 0.0)?;
        Some((self.price - prev) / prev * 100.0)
    }
}

/// Daily close observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Close prices of one ticker, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl HistoricalSeries {
    /// Build a series, rejecting out-of-order or duplicated dates and non-finite closes.
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, AnalysisError> {
        let ticker = ticker.into();
        if let Some(p) = points.iter().find(|p| !p.close.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "{}: non-finite close on {}",
                ticker, p.date
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::InvalidData(format!(
                "{}: dates not strictly increasing ({} then {})",
                ticker, w[0].date, w[1].date
            )));
        }
        Ok(Self { ticker, points })
    }

    /// Build a series from provider data: sorts by date, keeps the last close reported
    /// for a repeated date and drops non-finite closes.
    pub fn from_unsorted(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.close.is_finite());
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }

        Self {
            ticker: ticker.into(),
            points: deduped,
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            points: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Last `n` observations (the whole series when shorter).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    /// Copy of the series with every close multiplied by `factor` (currency conversion).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            ticker: self.ticker.clone(),
            points: self
                .points
                .iter()
                .map(|p| PricePoint::new(p.date, p.close * factor))
                .collect(),
        }
    }
}

/// Lookback window requested from a market data gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    Days(u32),
    Months(u32),
    Years(u32),
    Max,
    Since(NaiveDate),
}

impl HistoryPeriod {
    /// First calendar date covered by the period, `None` for the full history.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            HistoryPeriod::Days(n) => Some(today - Duration::days(i64::from(n))),
            HistoryPeriod::Months(n) => today.checked_sub_months(CalendarMonths::new(n)),
            HistoryPeriod::Years(n) => today.checked_sub_months(CalendarMonths::new(n * 12)),
            HistoryPeriod::Max => None,
            HistoryPeriod::Since(date) => Some(date),
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryPeriod::Days(n) => write!(f, "{}d", n),
            HistoryPeriod::Months(n) => write!(f, "{}mo", n),
            HistoryPeriod::Years(n) => write!(f, "{}y", n),
            HistoryPeriod::Max => write!(f, "max"),
            HistoryPeriod::Since(date) => write!(f, "since {}", date),
        }
    }
}

/// Company reference data. Any field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub beta: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_eps: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Trailing dividend yield as a fraction (0.012 = 1.2%)
    pub dividend_yield: Option<f64>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub previous_close: Option<f64>,
}

/// Geographic bucket derived from the listing exchange
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    American,
    European,
    Asian,
    OtherUnknown,
    /// Exchange code that matched no entry of the region table
    Unmatched(String),
}

impl Region {
    pub fn label(&self) -> String {
        match self {
            Region::American => "American Stock".to_string(),
            Region::European => "European Stock".to_string(),
            Region::Asian => "Asian Stock".to_string(),
            Region::OtherUnknown => "Other/Unknown Region".to_string(),
            Region::Unmatched(exchange) => format!("Other/Unknown Region (Exchange: {})", exchange),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Categorical risk level of a holding or a whole portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Moderate,
    High,
}

impl RiskLabel {
    pub const ALL: [RiskLabel; 3] = [RiskLabel::Low, RiskLabel::Moderate, RiskLabel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::Moderate => "Moderate",
            RiskLabel::High => "High",
        }
    }

    /// Dense class index used by classifiers
    pub fn index(&self) -> usize {
        match self {
            RiskLabel::Low => 0,
            RiskLabel::Moderate => 1,
            RiskLabel::High => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLabel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLabel::Low),
            "moderate" | "medium" => Ok(RiskLabel::Moderate),
            "high" => Ok(RiskLabel::High),
            other => Err(AnalysisError::InvalidData(format!("unknown risk level '{}'", other))),
        }
    }
}

/// Per-ticker metrics derived from history and fundamentals.
///
/// Every numeric field is optional: a missing value is left out of portfolio aggregates
/// instead of counting as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingMetrics {
    pub ticker: String,
    /// Position value used as the aggregation weight
    pub value: f64,
    pub daily_change_pct: Option<f64>,
    /// Short-term (30 day) volatility of daily changes, not annualized
    pub volatility: Option<f64>,
    /// Rolling 30 day volatility averaged over six months and annualized
    pub annualized_volatility: Option<f64>,
    pub beta: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield_pct: Option<f64>,
    pub price_stddev: Option<f64>,
    /// Percent return per period label ("1D", "1W", ...); undefined periods are absent
    pub period_returns: BTreeMap<String, f64>,
    pub max_drawdown_pct: Option<f64>,
    pub distance_from_52w_high_pct: Option<f64>,
    pub sector: String,
    pub region: Region,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_holding_validity() {
        assert!(Holding::new(" aapl ", 10.0).is_valid());
        assert_eq!(Holding::new(" aapl ", 10.0).ticker, "AAPL");
        assert!(!Holding::new("   ", 10.0).is_valid());
        assert!(!Holding::new("MSFT", 0.0).is_valid());
        assert!(!Holding::new("MSFT", -1.0).is_valid());
        assert!(!Holding::new("MSFT", f64::NAN).is_valid());
    }

    #[test]
    fn test_series_rejects_unordered_dates() {
        let points = vec![PricePoint::new(d(2025, 1, 2), 10.0), PricePoint::new(d(2025, 1, 1), 11.0)];
        assert!(HistoricalSeries::new("AAA", points).is_err());

        let dup = vec![PricePoint::new(d(2025, 1, 1), 10.0), PricePoint::new(d(2025, 1, 1), 11.0)];
        assert!(HistoricalSeries::new("AAA", dup).is_err());
    }

    #[test]
    fn test_series_from_unsorted_repairs_input() {
        let points = vec![
            PricePoint::new(d(2025, 1, 3), 12.0),
            PricePoint::new(d(2025, 1, 1), 10.0),
            PricePoint::new(d(2025, 1, 3), 13.0),
            PricePoint::new(d(2025, 1, 2), f64::NAN),
        ];
        let series = HistoricalSeries::from_unsorted("AAA", points);
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 13.0]);
        assert_eq!(series.last().unwrap().date, d(2025, 1, 3));
    }

    #[test]
    fn test_history_period_start_dates() {
        let today = d(2025, 3, 31);
        assert_eq!(HistoryPeriod::Days(30).start_date(today), Some(d(2025, 3, 1)));
        assert_eq!(HistoryPeriod::Months(6).start_date(today), Some(d(2024, 9, 30)));
        assert_eq!(HistoryPeriod::Years(1).start_date(today), Some(d(2024, 3, 31)));
        assert_eq!(HistoryPeriod::Max.start_date(today), None);
        assert_eq!(HistoryPeriod::Months(6).to_string(), "6mo");
    }

    #[test]
    fn test_region_labels() {
        assert_eq!(Region::European.label(), "European Stock");
        assert_eq!(
            Region::Unmatched("xyz".to_string()).label(),
            "Other/Unknown Region (Exchange: xyz)"
        );
    }

    #[test]
    fn test_risk_label_parse() {
        assert_eq!("high".parse::<RiskLabel>().unwrap(), RiskLabel::High);
        assert_eq!(" Moderate ".parse::<RiskLabel>().unwrap(), RiskLabel::Moderate);
        assert!("extreme".parse::<RiskLabel>().is_err());
        assert_eq!(RiskLabel::from_index(RiskLabel::Low.index()), Some(RiskLabel::Low));
    }

    #[test]
    fn test_daily_change() {
        let priced = PricedHolding {
            holding: Holding::new("AAA", 2.0),
            price: 102.0,
            previous_close: Some(100.0),
            value: 204.0,
        };
        assert!((priced.daily_change_pct().unwrap() - 2.0).abs() < 1e-12);

        let no_prev = PricedHolding { previous_close: None, ..priced };
        assert!(no_prev.daily_change_pct().is_none());
    }
}
