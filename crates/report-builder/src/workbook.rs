use analysis_core::AnalysisError;
use serde::Serialize;

use crate::records::ReportInput;

pub const WORKBOOK_DIR: &str = "portfolio_report";
pub const FUNDAMENTALS_SHEET: &str = "Fundamentals";
pub const TECHNICALS_SHEET: &str = "Technicals";
pub const INPUT_SHEET: &str = "Original Input";

/// A named CSV sheet
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub csv: Vec<u8>,
}

impl Sheet {
    /// Path of the sheet inside the export archive
    pub fn entry_name(&self) -> String {
        format!("{}/{}.csv", WORKBOOK_DIR, self.name)
    }
}

fn export_err(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::ExportError(e.to_string())
}

/// Serialize rows into a CSV sheet with a header taken from the row type.
pub fn write_sheet<T: Serialize>(name: &str, rows: &[T]) -> Result<Sheet, AnalysisError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(export_err)?;
    }
    let csv = writer.into_inner().map_err(export_err)?;

    Ok(Sheet {
        name: name.to_string(),
        csv,
    })
}

/// The three workbook sheets in archive order.
pub fn build_workbook(input: &ReportInput) -> Result<Vec<Sheet>, AnalysisError> {
    if input.fundamentals.is_empty() || input.technicals.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    Ok(vec![
        write_sheet(FUNDAMENTALS_SHEET, &input.fundamentals)?,
        write_sheet(TECHNICALS_SHEET, &input.technicals)?,
        write_sheet(INPUT_SHEET, &input.holdings)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FundamentalsRecord, TechnicalRecord};
    use analysis_core::{Fundamentals, Holding};
    use chrono::NaiveDate;

    fn input() -> ReportInput {
        let f = Fundamentals {
            sector: Some("Technology".to_string()),
            pe_ratio: Some(28.0),
            ..Default::default()
        };
        ReportInput {
            fundamentals: vec![FundamentalsRecord::new("AAPL", &f)],
            technicals: vec![TechnicalRecord {
                ticker: "AAPL".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                close: 190.5,
                sma_50: None,
                sma_200: None,
                volatility: None,
                rsi: Some(55.0),
            }],
            holdings: vec![Holding::new("AAPL", 10.0)],
        }
    }

    #[test]
    fn test_sheet_headers() {
        let sheets = build_workbook(&input()).unwrap();
        assert_eq!(sheets.len(), 3);

        let fundamentals = String::from_utf8(sheets[0].csv.clone()).unwrap();
        assert!(fundamentals.starts_with(
            "Ticker,Sector,Industry,Exchange,Market Cap,P/E,Forward EPS,Dividend Yield,Beta,Price to Book,52W High,52W Low\n"
        ));

        let technicals = String::from_utf8(sheets[1].csv.clone()).unwrap();
        let lines: Vec<&str> = technicals.lines().collect();
        assert_eq!(lines[0], "Ticker,Date,Close,SMA_50,SMA_200,Volatility,RSI");
        assert_eq!(lines[1], "AAPL,2025-01-02,190.5,,,,55.0");

        let original = String::from_utf8(sheets[2].csv.clone()).unwrap();
        assert_eq!(original, "ticker,quantity\nAAPL,10.0\n");
    }

    #[test]
    fn test_entry_names() {
        let sheets = build_workbook(&input()).unwrap();
        let names: Vec<String> = sheets.iter().map(Sheet::entry_name).collect();
        assert_eq!(
            names,
            vec![
                "portfolio_report/Fundamentals.csv",
                "portfolio_report/Technicals.csv",
                "portfolio_report/Original Input.csv",
            ]
        );
    }

    #[test]
    fn test_empty_tables_rejected() {
        let mut no_technicals = input();
        no_technicals.technicals.clear();
        assert_eq!(build_workbook(&no_technicals), Err(AnalysisError::EmptyInput));

        let mut no_fundamentals = input();
        no_fundamentals.fundamentals.clear();
        assert_eq!(build_workbook(&no_fundamentals), Err(AnalysisError::EmptyInput));
    }
}
