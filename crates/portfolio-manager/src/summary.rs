use analysis_core::{HoldingMetrics, Region};
use std::collections::{BTreeMap, BTreeSet};

use crate::aggregation::{group_sum, weighted_average};
use crate::models::{PortfolioSummary, Valuation};
use crate::region::region_diversification;

impl PortfolioSummary {
    /// Aggregate per-holding metrics into portfolio statistics.
    ///
    /// `metrics` holds one entry per priced holding, in valuation order. Weighted
    /// statistics with no defined input come out as `None`.
    pub fn build(valuation: &Valuation, metrics: &[HoldingMetrics]) -> Self {
        let weights: Vec<f64> = metrics.iter().map(|m| m.value).collect();
        let weighted = |values: Vec<Option<f64>>| weighted_average(&values, &weights).ok();

        let weighted_daily_change_pct = weighted(metrics.iter().map(|m| m.daily_change_pct).collect());
        let weighted_volatility = weighted(metrics.iter().map(|m| m.volatility).collect());
        let weighted_dividend_yield_pct =
            weighted(metrics.iter().map(|m| m.dividend_yield_pct).collect());

        let sector_breakdown = group_sum(metrics, |m| m.sector.clone(), |m| m.value);
        let sector_count = metrics.iter().map(|m| m.sector.as_str()).collect::<BTreeSet<_>>().len();

        let regions: BTreeMap<&str, &Region> =
            metrics.iter().map(|m| (m.ticker.as_str(), &m.region)).collect();
        let region_breakdown = region_diversification(&valuation.holdings, |h| {
            regions
                .get(h.ticker())
                .map(|r| (*r).clone())
                .unwrap_or_else(|| Region::Unmatched(String::new()))
        })
        .map(|by_region| {
            by_region
                .into_iter()
                .map(|(region, pct)| (region.label(), pct))
                .collect()
        })
        .map_err(|e| e.to_string());

        Self {
            total_value: valuation.total_value,
            holdings_count: valuation.holdings.len(),
            weighted_daily_change_pct,
            weighted_volatility,
            weighted_dividend_yield_pct,
            sector_breakdown,
            sector_count,
            region_breakdown,
            allocation: valuation.allocation(),
            top_holding: valuation.top_holding().map(|h| h.ticker().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::value_holdings;
    use analysis_core::{Holding, Quote};
    use approx::assert_relative_eq;

    fn metrics(ticker: &str, value: f64, vol: Option<f64>, sector: &str, region: Region) -> HoldingMetrics {
        HoldingMetrics {
            ticker: ticker.to_string(),
            value,
            daily_change_pct: Some(1.0),
            volatility: vol,
            annualized_volatility: None,
            beta: None,
            pe_ratio: None,
            dividend_yield_pct: None,
            price_stddev: None,
            period_returns: BTreeMap::new(),
            max_drawdown_pct: None,
            distance_from_52w_high_pct: None,
            sector: sector.to_string(),
            region,
        }
    }

    fn valuation() -> Valuation {
        let holdings = vec![Holding::new("AAA", 3.0), Holding::new("BBB", 1.0)];
        let quotes = BTreeMap::from([
            ("AAA".to_string(), Quote { price: 100.0, previous_close: Some(99.0) }),
            ("BBB".to_string(), Quote { price: 100.0, previous_close: None }),
        ]);
        value_holdings(&holdings, &quotes).unwrap()
    }

    #[test]
    fn test_summary_build() {
        let v = valuation();
        let m = vec![
            metrics("AAA", 300.0, Some(0.02), "Technology", Region::American),
            metrics("BBB", 100.0, None, "Energy", Region::European),
        ];
        let s = PortfolioSummary::build(&v, &m);

        assert_eq!(s.total_value, 400.0);
        assert_eq!(s.holdings_count, 2);
        assert_eq!(s.top_holding.as_deref(), Some("AAA"));
        assert_eq!(s.sector_count, 2);
        assert_eq!(s.sector_breakdown["Technology"], 300.0);
        // BBB has no volatility: only AAA contributes
        assert_relative_eq!(s.weighted_volatility.unwrap(), 0.02);
        assert_relative_eq!(s.weighted_daily_change_pct.unwrap(), 1.0);
        assert!(s.weighted_dividend_yield_pct.is_none());

        let regions = s.region_breakdown.unwrap();
        assert_relative_eq!(regions["American Stock"], 75.0, epsilon = 1e-9);
        assert_relative_eq!(regions["European Stock"], 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_summary_is_deterministic() {
        let v = valuation();
        let m = vec![
            metrics("AAA", 300.0, Some(0.02), "Technology", Region::Asian),
            metrics("BBB", 100.0, Some(0.01), "Unknown", Region::Unmatched("xyz".to_string())),
        ];
        assert_eq!(PortfolioSummary::build(&v, &m), PortfolioSummary::build(&v, &m));

        let json = serde_json::to_string(&PortfolioSummary::build(&v, &m)).unwrap();
        assert!(json.contains("Other/Unknown Region (Exchange: xyz)"));
    }

    #[test]
    fn test_empty_valuation_reports_region_error() {
        let v = Valuation {
            holdings: Vec::new(),
            total_value: 0.0,
            excluded: vec!["ZZZ".to_string()],
        };
        let s = PortfolioSummary::build(&v, &[]);
        assert!(s.region_breakdown.is_err());
        assert!(s.weighted_volatility.is_none());
        assert!(s.top_holding.is_none());
    }
}
