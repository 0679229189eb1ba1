use analysis_core::{AnalysisError, Holding, RiskLabel};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Holdings loaded when the user has not entered any
pub const SAMPLE_PORTFOLIO: [(&str, f64); 15] = [
    ("AAPL", 10.0),
    ("MSFT", 5.0),
    ("TSLA", 3.0),
    ("AMZN", 8.0),
    ("GOOGL", 6.0),
    ("NESN.SW", 12.0),
    ("ASML.AS", 4.0),
    ("MC.PA", 2.0),
    ("SIE.DE", 7.0),
    ("ULVR.L", 9.0),
    ("7203.T", 15.0),
    ("005930.KS", 1.0),
    ("9988.HK", 10.0),
    ("TCS.NS", 5.0),
    ("0700.HK", 8.0),
];

/// Per-user analysis state: the raw portfolio entries (possibly incomplete) and the
/// declared target risk. Owned by the caller and passed to each pipeline operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    entries: Vec<Holding>,
    pub target_risk: RiskLabel,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            target_risk: RiskLabel::Moderate,
        }
    }
}

impl Session {
    pub fn new(target_risk: RiskLabel) -> Self {
        Self {
            entries: Vec::new(),
            target_risk,
        }
    }

    pub fn with_holdings(holdings: Vec<Holding>, target_risk: RiskLabel) -> Self {
        Self {
            entries: holdings,
            target_risk,
        }
    }

    pub fn sample(target_risk: RiskLabel) -> Self {
        let holdings = SAMPLE_PORTFOLIO
            .iter()
            .map(|(ticker, qty)| Holding::new(ticker, *qty))
            .collect();
        Self::with_holdings(holdings, target_risk)
    }

    pub fn entries(&self) -> &[Holding] {
        &self.entries
    }

    /// Append a blank entry and return its index
    pub fn add_entry(&mut self) -> usize {
        self.entries.push(Holding::new("", 0.0));
        self.entries.len() - 1
    }

    pub fn set_entry(&mut self, index: usize, ticker: &str, quantity: f64) -> Result<(), AnalysisError> {
        let len = self.entries.len();
        let entry = self.entries.get_mut(index).ok_or_else(|| {
            AnalysisError::InvalidData(format!("entry {} out of range ({} entries)", index, len))
        })?;
        *entry = Holding::new(ticker, quantity);
        Ok(())
    }

    pub fn remove_entry(&mut self, index: usize) -> Option<Holding> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Entries with a ticker and a positive quantity, in entry order
    pub fn valid_holdings(&self) -> Vec<Holding> {
        self.entries.iter().filter(|h| h.is_valid()).cloned().collect()
    }

    pub fn is_ready(&self) -> bool {
        self.entries.iter().any(Holding::is_valid)
    }

    /// Replace a portfolio with no entries at all by the sample one. Returns whether it did.
    /// Entries that are present but invalid are kept, so such a session stays not ready.
    pub fn fill_with_sample_if_empty(&mut self) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        let target = self.target_risk;
        *self = Self::sample(target);
        true
    }

    /// Load entries from CSV with `ticker,quantity` columns (header row required).
    /// Rows whose quantity does not parse become invalid entries and are ignored by runs.
    pub fn from_csv_reader<R: Read>(reader: R, target_risk: RiskLabel) -> Result<Self, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| AnalysisError::InvalidData(e.to_string()))?;
            let ticker = record.get(0).unwrap_or("");
            let quantity: f64 = record
                .get(1)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0);
            if ticker.is_empty() && quantity == 0.0 {
                continue;
            }
            entries.push(Holding::new(ticker, quantity));
        }

        Ok(Self::with_holdings(entries, target_risk))
    }

    /// Parse `AAPL=10,MSFT=5` style holdings
    pub fn from_pairs(pairs: &str, target_risk: RiskLabel) -> Result<Self, AnalysisError> {
        let mut entries = Vec::new();
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (ticker, qty) = pair.split_once('=').ok_or_else(|| {
                AnalysisError::InvalidData(format!("expected TICKER=QUANTITY, got '{}'", pair))
            })?;
            let quantity: f64 = qty.trim().parse().map_err(|_| {
                AnalysisError::InvalidData(format!("invalid quantity '{}' for {}", qty.trim(), ticker.trim()))
            })?;
            entries.push(Holding::new(ticker, quantity));
        }
        Ok(Self::with_holdings(entries, target_risk))
    }
}
