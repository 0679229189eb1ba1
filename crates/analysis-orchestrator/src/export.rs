use analysis_core::{AnalysisError, HistoryPeriod, MarketDataGateway};
use portfolio_manager::Session;
use report_builder::{FundamentalsRecord, ReportAssembler, ReportInput};
use technical_analysis::technical_rows;

use crate::pipeline::PortfolioPipeline;

impl<G: MarketDataGateway> PortfolioPipeline<G> {
    /// Gather fundamentals and daily technicals for every ticker of the session.
    /// Tickers without history contribute a fundamentals row only.
    pub async fn export_input(&self, session: &Session) -> Result<ReportInput, AnalysisError> {
        let holdings = session.valid_holdings();
        if holdings.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let mut input = ReportInput {
            holdings: holdings.clone(),
            ..Default::default()
        };
        let period = HistoryPeriod::Years(self.config.export_years);

        for holding in &holdings {
            let ticker = holding.ticker.as_str();
            if input.fundamentals.iter().any(|f| f.ticker == ticker) {
                continue;
            }

            let fundamentals = self.data.fundamentals(ticker).await;
            input.fundamentals.push(FundamentalsRecord::new(ticker, &fundamentals));

            let series = self.data.history(ticker, period).await;
            if series.is_empty() {
                tracing::warn!("No {} history for {}, exporting fundamentals only", period, ticker);
                continue;
            }
            input.push_technicals(ticker, &technical_rows(&series));
        }

        Ok(input)
    }

    /// Zip archive bytes of the export workbook and text summary
    pub async fn export(&self, session: &Session) -> Result<Vec<u8>, AnalysisError> {
        let input = self.export_input(session).await?;
        ReportAssembler::new().to_bytes(&input)
    }
}
