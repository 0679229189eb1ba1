use analysis_core::{
    AnalysisError, Holding, HoldingMetrics, HistoryPeriod, MarketDataGateway, PricedHolding,
    Quote, RiskLabel,
};
use market_data::CachedGateway;
use portfolio_manager::{
    classify_exchange, portfolio_vs_benchmark, value_holdings, PortfolioHistory,
    PortfolioSummary, Session, Valuation,
};
use risk_manager::{PortfolioRiskReport, RiskClassifier, RiskInput};
use serde::Serialize;
use std::collections::BTreeMap;
use technical_analysis::{
    annualized_volatility, distance_from_high, max_drawdown, period_return, price_std_dev,
    short_term_volatility,
};

use crate::config::PipelineConfig;

/// Trailing return columns of [`HoldingMetrics::period_returns`], in calendar days
const METRIC_PERIODS: [(&str, u32); 4] = [("1W", 7), ("1M", 30), ("3M", 91), ("6M", 182)];

/// Everything one overview run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub target_risk: RiskLabel,
    pub valuation: Valuation,
    /// One entry per priced holding, in valuation order
    pub metrics: Vec<HoldingMetrics>,
    pub summary: PortfolioSummary,
    pub risk: Result<PortfolioRiskReport, String>,
    pub history: PortfolioHistory,
}

/// Runs portfolio analysis over an injected gateway.
///
/// All market data goes through one memoizing [`CachedGateway`], so repeated runs over the
/// same session reuse earlier lookups. Calls are awaited one after another.
pub struct PortfolioPipeline<G> {
    pub(crate) data: CachedGateway<G>,
    pub(crate) config: PipelineConfig,
    classifier: RiskClassifier,
}

impl<G: MarketDataGateway> PortfolioPipeline<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_config(gateway, PipelineConfig::default())
    }

    pub fn with_config(gateway: G, config: PipelineConfig) -> Self {
        let classifier = RiskClassifier::new(config.forest.clone());
        Self {
            data: CachedGateway::new(gateway),
            config,
            classifier,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The memo layer, e.g. to clear it between unrelated sessions
    pub fn data(&self) -> &CachedGateway<G> {
        &self.data
    }

    pub async fn run(&self, session: &Session) -> Result<PipelineReport, AnalysisError> {
        let holdings = session.valid_holdings();
        if holdings.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        tracing::info!(
            "Starting portfolio run: {} holdings, target risk {}",
            holdings.len(),
            session.target_risk
        );

        let valuation = self.value(&holdings).await?;

        let mut metrics = Vec::with_capacity(valuation.holdings.len());
        for holding in &valuation.holdings {
            metrics.push(self.holding_metrics(holding).await);
        }

        let summary = PortfolioSummary::build(&valuation, &metrics);
        let risk = self
            .assess_risk(&metrics, session.target_risk)
            .map_err(|e| {
                tracing::warn!("Risk classification unavailable: {}", e);
                e.to_string()
            });
        let history = self.portfolio_history(&valuation).await;

        tracing::info!(
            "Portfolio run complete: total value {:.2} over {} priced holdings, {} excluded",
            valuation.total_value,
            valuation.holdings.len(),
            valuation.excluded.len()
        );

        Ok(PipelineReport {
            target_risk: session.target_risk,
            valuation,
            metrics,
            summary,
            risk,
            history,
        })
    }

    /// One price lookup per unique ticker; the previous close comes from fundamentals,
    /// which are only fetched for tickers that priced.
    pub async fn value(&self, holdings: &[Holding]) -> Result<Valuation, AnalysisError> {
        let mut quotes = BTreeMap::new();
        for holding in holdings {
            if quotes.contains_key(&holding.ticker) {
                continue;
            }
            let price = self.data.price(&holding.ticker).await;
            let previous_close = if price > 0.0 {
                self.data.fundamentals(&holding.ticker).await.previous_close
            } else {
                None
            };
            quotes.insert(holding.ticker.clone(), Quote { price, previous_close });
        }

        value_holdings(holdings, &quotes)
    }

    async fn holding_metrics(&self, holding: &PricedHolding) -> HoldingMetrics {
        let ticker = holding.ticker();
        let cfg = &self.config;

        let fundamentals = self.data.fundamentals(ticker).await;
        let short = self
            .data
            .history(ticker, HistoryPeriod::Days(cfg.volatility_window as u32))
            .await;
        let drawdown = self
            .data
            .history(ticker, HistoryPeriod::Days(cfg.drawdown_window as u32))
            .await;
        let features = self
            .data
            .history(ticker, HistoryPeriod::Months(cfg.feature_months))
            .await;

        let period_returns = METRIC_PERIODS
            .iter()
            .filter_map(|(label, days)| {
                period_return(&features, *days).map(|r| (label.to_string(), r))
            })
            .collect();

        HoldingMetrics {
            ticker: ticker.to_string(),
            value: holding.value,
            daily_change_pct: holding.daily_change_pct(),
            volatility: short_term_volatility(&short, cfg.volatility_window),
            annualized_volatility: annualized_volatility(&features, cfg.volatility_window),
            beta: fundamentals.beta,
            pe_ratio: fundamentals.pe_ratio,
            dividend_yield_pct: fundamentals.dividend_yield.map(|y| y * 100.0),
            price_stddev: price_std_dev(&features),
            period_returns,
            max_drawdown_pct: max_drawdown(&drawdown, cfg.drawdown_window),
            distance_from_52w_high_pct: distance_from_high(
                holding.price,
                fundamentals.fifty_two_week_high,
            ),
            sector: fundamentals.sector.clone().unwrap_or_else(|| "Unknown".to_string()),
            region: classify_exchange(fundamentals.exchange.as_deref()),
        }
    }

    /// Classify one row per unique ticker. A repeated ticker keeps its first metrics.
    pub fn assess_risk(
        &self,
        metrics: &[HoldingMetrics],
        target: RiskLabel,
    ) -> Result<PortfolioRiskReport, AnalysisError> {
        let mut inputs: Vec<RiskInput> = Vec::with_capacity(metrics.len());
        for m in metrics {
            if inputs.iter().any(|i| i.ticker == m.ticker) {
                continue;
            }
            inputs.push(RiskInput {
                ticker: m.ticker.clone(),
                volatility: m.annualized_volatility,
                beta: m.beta,
                pe_ratio: m.pe_ratio,
                dividend_yield_pct: m.dividend_yield_pct.unwrap_or(0.0),
                price_stddev: m.price_stddev,
            });
        }

        self.classifier.classify(&inputs, target)
    }

    async fn portfolio_history(&self, valuation: &Valuation) -> PortfolioHistory {
        let period = HistoryPeriod::Days(self.config.overview_history_days);

        let mut positions = Vec::new();
        for (ticker, quantity) in valuation.quantities() {
            let series = self.data.history(&ticker, period).await;
            if !series.is_empty() {
                positions.push((series, quantity));
            }
        }

        let symbol = &self.config.overview_benchmark;
        let benchmark = self.data.history(symbol, period).await;
        portfolio_vs_benchmark(&positions, &benchmark, symbol)
    }
}
