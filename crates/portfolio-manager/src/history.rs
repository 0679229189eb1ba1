use analysis_core::HistoricalSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{HistoryPoint, PortfolioHistory};

/// Compare portfolio value against a benchmark over the same window.
///
/// The portfolio value on a date is `Σ close × quantity` over the holdings that have a
/// close that day. Both curves are normalized to 1.0 at their first observation and the
/// benchmark is joined onto the portfolio dates.
pub fn portfolio_vs_benchmark(
    positions: &[(HistoricalSeries, f64)],
    benchmark: &HistoricalSeries,
    benchmark_symbol: &str,
) -> PortfolioHistory {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (series, quantity) in positions {
        for p in series.points() {
            *totals.entry(p.date).or_insert(0.0) += p.close * quantity;
        }
    }

    let base = match totals.values().next() {
        Some(&v) if v > 0.0 => v,
        _ => return PortfolioHistory::empty(benchmark_symbol),
    };

    let bench_base = benchmark.first().map(|p| p.close).filter(|c| *c > 0.0);
    let bench_by_date: BTreeMap<NaiveDate, f64> = benchmark
        .points()
        .iter()
        .map(|p| (p.date, p.close))
        .collect();

    let points = totals
        .into_iter()
        .map(|(date, value)| HistoryPoint {
            date,
            portfolio: value / base,
            benchmark: bench_base.and_then(|b| bench_by_date.get(&date).map(|c| c / b)),
        })
        .collect();

    PortfolioHistory {
        benchmark_symbol: benchmark_symbol.to_string(),
        points,
    }
}
