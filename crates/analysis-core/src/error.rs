use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No valid holdings to analyze")]
    EmptyInput,

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Zero denominator: {0}")]
    ZeroDenominator(String),

    #[error("Fetch failed for {ticker}: {reason}")]
    FetchFailed { ticker: String, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Export error: {0}")]
    ExportError(String),
}

impl AnalysisError {
    pub fn fetch(ticker: &str, reason: impl Into<String>) -> Self {
        AnalysisError::FetchFailed {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}
