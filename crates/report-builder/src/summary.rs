use crate::records::FundamentalsRecord;

pub const SUMMARY_TITLE: &str = "Portfolio Summary Report";
pub const FUNDAMENTALS_HEADING: &str = "Fundamentals Overview";

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// Shortest round-trip form that keeps a decimal point: 24.0 stays "24.0"
fn ratio_text(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:?}", v))
}

/// One overview line per ticker, yield shown in percent with a missing yield as zero.
pub fn summary_line(record: &FundamentalsRecord) -> String {
    format!(
        "{} | Sector: {} | P/E: {} | Yield: {:.2}%",
        record.ticker,
        or_na(record.sector.as_deref()),
        ratio_text(record.pe_ratio),
        record.dividend_yield.unwrap_or(0.0) * 100.0
    )
}

pub fn summary_text(fundamentals: &[FundamentalsRecord]) -> String {
    let mut lines = vec![
        SUMMARY_TITLE.to_string(),
        String::new(),
        FUNDAMENTALS_HEADING.to_string(),
    ];
    lines.extend(fundamentals.iter().map(summary_line));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
