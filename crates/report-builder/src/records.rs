use analysis_core::{Fundamentals, Holding};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use technical_analysis::TechnicalRow;

/// One row of the Fundamentals sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "Exchange")]
    pub exchange: Option<String>,
    #[serde(rename = "Market Cap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "P/E")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "Forward EPS")]
    pub forward_eps: Option<f64>,
    /// Fraction, as reported upstream
    #[serde(rename = "Dividend Yield")]
    pub dividend_yield: Option<f64>,
    #[serde(rename = "Beta")]
    pub beta: Option<f64>,
    #[serde(rename = "Price to Book")]
    pub price_to_book: Option<f64>,
    #[serde(rename = "52W High")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(rename = "52W Low")]
    pub fifty_two_week_low: Option<f64>,
}

impl FundamentalsRecord {
    pub fn new(ticker: impl Into<String>, f: &Fundamentals) -> Self {
        Self {
            ticker: ticker.into(),
            sector: f.sector.clone(),
            industry: f.industry.clone(),
            exchange: f.exchange.clone(),
            market_cap: f.market_cap,
            pe_ratio: f.pe_ratio,
            forward_eps: f.forward_eps,
            dividend_yield: f.dividend_yield,
            beta: f.beta,
            price_to_book: f.price_to_book,
            fifty_two_week_high: f.fifty_two_week_high,
            fifty_two_week_low: f.fifty_two_week_low,
        }
    }
}

/// One ticker-day of the Technicals sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalRecord {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "SMA_50")]
    pub sma_50: Option<f64>,
    #[serde(rename = "SMA_200")]
    pub sma_200: Option<f64>,
    #[serde(rename = "Volatility")]
    pub volatility: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
}

impl TechnicalRecord {
    pub fn from_row(ticker: &str, row: &TechnicalRow) -> Self {
        Self {
            ticker: ticker.to_string(),
            date: row.date,
            close: row.close,
            sma_50: row.sma_50,
            sma_200: row.sma_200,
            volatility: row.volatility,
            rsi: row.rsi,
        }
    }
}

/// Everything the export archive is assembled from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportInput {
    pub fundamentals: Vec<FundamentalsRecord>,
    pub technicals: Vec<TechnicalRecord>,
    pub holdings: Vec<Holding>,
}

impl ReportInput {
    /// Append the technical rows of one ticker
    pub fn push_technicals(&mut self, ticker: &str, rows: &[TechnicalRow]) {
        self.technicals
            .extend(rows.iter().map(|row| TechnicalRecord::from_row(ticker, row)));
    }
}
