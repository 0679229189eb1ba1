#[cfg(test)]
mod pipeline_tests {
    use crate::{PortfolioPipeline, ReturnPeriod};
    use analysis_core::{
        AnalysisError, Fundamentals, HistoricalSeries, HistoryPeriod, Holding, PricePoint,
        RiskLabel,
    };
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};
    use market_data::StaticGateway;
    use portfolio_manager::Session;
    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use technical_analysis::{period_return, rsi, total_return};

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    /// 400 daily closes ending on `as_of`
    fn series(ticker: &str, base: f64, phase: f64) -> HistoricalSeries {
        let points = (0..400)
            .map(|i| {
                let date = as_of() - Duration::days(399 - i);
                let x = i as f64;
                PricePoint::new(date, base + 10.0 * (x * 0.3 + phase).sin() + 0.05 * x)
            })
            .collect();
        HistoricalSeries::new(ticker, points).unwrap()
    }

    fn aaa_fundamentals() -> Fundamentals {
        Fundamentals {
            sector: Some("Technology".to_string()),
            exchange: Some("NMS".to_string()),
            currency: Some("USD".to_string()),
            beta: Some(1.1),
            pe_ratio: Some(25.0),
            dividend_yield: Some(0.015),
            fifty_two_week_high: Some(125.0),
            previous_close: Some(98.0),
            ..Default::default()
        }
    }

    fn gateway(fundamentals: Fundamentals) -> Arc<StaticGateway> {
        Arc::new(
            StaticGateway::new()
                .with_price("AAA", 100.0)
                .with_history(series("AAA", 100.0, 0.0))
                .with_history(series("SPY", 500.0, 1.0))
                .with_fundamentals("AAA", fundamentals)
                .with_fx_rate("EUR", 2.0)
                .as_of(as_of()),
        )
    }

    fn session() -> Session {
        Session::with_holdings(
            vec![Holding::new("AAA", 10.0), Holding::new("BBB", 5.0)],
            RiskLabel::Moderate,
        )
    }

    #[tokio::test]
    async fn test_unpriced_ticker_never_reaches_downstream() {
        let gw = gateway(aaa_fundamentals());
        let pipeline = PortfolioPipeline::new(gw.clone());
        let report = pipeline.run(&session()).await.unwrap();

        assert_relative_eq!(report.valuation.total_value, 1000.0);
        assert_eq!(report.valuation.holdings.len(), 1);
        assert_eq!(report.valuation.excluded, vec!["BBB".to_string()]);
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.metrics[0].ticker, "AAA");

        let summary = &report.summary;
        assert_eq!(summary.holdings_count, 1);
        assert_eq!(summary.top_holding.as_deref(), Some("AAA"));
        assert_relative_eq!(summary.allocation["AAA"], 100.0);
        assert_relative_eq!(summary.weighted_dividend_yield_pct.unwrap(), 1.5, epsilon = 1e-12);
        assert_relative_eq!(summary.weighted_daily_change_pct.unwrap(), 2.0 / 98.0 * 100.0, epsilon = 1e-9);
        let regions = summary.region_breakdown.as_ref().unwrap();
        assert_relative_eq!(regions["American Stock"], 100.0);

        // BBB was asked for a price once and nothing else
        let calls = gw.calls();
        assert_eq!(calls.price, 2);
        assert_eq!(calls.fundamentals, 1);
        // AAA: 30d, 90d and 6mo histories; the 30d overview curve reuses the first; SPY once
        assert_eq!(calls.history, 4);
    }

    #[tokio::test]
    async fn test_metrics_and_risk() {
        let pipeline = PortfolioPipeline::new(gateway(aaa_fundamentals()));
        let report = pipeline.run(&session()).await.unwrap();

        let m = &report.metrics[0];
        assert!(m.volatility.is_some());
        assert!(m.annualized_volatility.is_some());
        assert!(m.price_stddev.is_some());
        assert!(m.max_drawdown_pct.unwrap() <= 0.0);
        assert_relative_eq!(m.distance_from_52w_high_pct.unwrap(), -20.0, epsilon = 1e-9);
        assert!(m.period_returns.contains_key("1M"));
        assert_eq!(m.sector, "Technology");

        let risk = report.risk.as_ref().unwrap();
        assert_eq!(risk.assessments.len(), 1);
        assert_eq!(risk.assessments[0].ticker(), "AAA");
        assert_eq!(risk.portfolio_label, risk.assessments[0].heuristic);
        assert_eq!(risk.target, RiskLabel::Moderate);

        let history = &report.history;
        assert_eq!(history.benchmark_symbol, "SPY");
        assert!(!history.points.is_empty());
        assert_relative_eq!(history.points[0].portfolio, 1.0);
        assert_relative_eq!(history.points[0].benchmark.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_rerun_is_identical_and_fully_cached() {
        let gw = gateway(aaa_fundamentals());
        let pipeline = PortfolioPipeline::new(gw.clone());

        let first = pipeline.run(&session()).await.unwrap();
        let calls = gw.calls();
        let second = pipeline.run(&session()).await.unwrap();

        assert_eq!(first.summary, second.summary);
        assert_eq!(first, second);
        assert_eq!(gw.calls(), calls);
    }

    #[tokio::test]
    async fn test_empty_session_short_circuits() {
        let pipeline = PortfolioPipeline::new(gateway(aaa_fundamentals()));

        let err = pipeline.run(&Session::new(RiskLabel::Low)).await.unwrap_err();
        assert_eq!(err, AnalysisError::EmptyInput);

        let mut invalid = Session::new(RiskLabel::Low);
        let index = invalid.add_entry();
        invalid.set_entry(index, "AAA", 0.0).unwrap();
        assert_eq!(pipeline.run(&invalid).await.unwrap_err(), AnalysisError::EmptyInput);
        assert_eq!(pipeline.export(&invalid).await.unwrap_err(), AnalysisError::EmptyInput);
    }

    #[tokio::test]
    async fn test_missing_features_leave_risk_unavailable() {
        let fundamentals = Fundamentals {
            beta: None,
            ..aaa_fundamentals()
        };
        let pipeline = PortfolioPipeline::new(gateway(fundamentals));
        let report = pipeline.run(&session()).await.unwrap();

        let reason = report.risk.unwrap_err();
        assert!(reason.starts_with("Insufficient data"), "{}", reason);
        // The rest of the run is unaffected
        assert_relative_eq!(report.summary.total_value, 1000.0);
    }

    #[tokio::test]
    async fn test_price_changes() {
        let pipeline = PortfolioPipeline::new(gateway(aaa_fundamentals()));
        let valuation = pipeline.value(&session().valid_holdings()).await.unwrap();
        let changes = pipeline.price_changes(&valuation, ReturnPeriod::SixMonths).await;

        assert_eq!(changes.period, ReturnPeriod::SixMonths);
        assert_eq!(changes.rows.len(), 1);

        let row = &changes.rows[0];
        assert_eq!(row.ticker, "AAA");
        assert_relative_eq!(row.price, 100.0);

        let six_months = pipeline.data().history("AAA", HistoryPeriod::Months(6)).await;
        assert_eq!(row.selected_pct, total_return(&six_months));
        let month = pipeline.data().history("AAA", HistoryPeriod::Days(30)).await;
        assert_eq!(row.one_month_pct, total_return(&month));

        assert!(row.volatility_30d_pct.unwrap() > 0.0);
        assert!(row.max_drawdown_90d_pct.unwrap() <= 0.0);
        let ninety = pipeline.data().history("AAA", HistoryPeriod::Days(90)).await;
        assert_eq!(row.rsi, rsi(&ninety, 14));
        assert!((0.0..=100.0).contains(&row.rsi.unwrap()));

        let rebased = &changes.normalized_history["AAA"];
        assert_relative_eq!(rebased[0].1, 100.0);
        assert!(!changes.normalized_history.contains_key("BBB"));
    }

    #[tokio::test]
    async fn test_performance_converts_to_usd() {
        let fundamentals = Fundamentals {
            currency: Some("EUR".to_string()),
            ..aaa_fundamentals()
        };
        let pipeline = PortfolioPipeline::new(gateway(fundamentals));
        let valuation = pipeline.value(&session().valid_holdings()).await.unwrap();

        let start = as_of() - Duration::days(300);
        let benchmarks = vec!["SPY".to_string(), "^GSPC".to_string()];
        let report = pipeline.performance(&valuation, start, &benchmarks).await;

        let raw = pipeline.data().history("AAA", HistoryPeriod::Since(start)).await;
        assert_eq!(report.fx_factors["AAA"], 2.0);
        assert_relative_eq!(report.prices["AAA"].first().unwrap().close, raw.first().unwrap().close * 2.0);

        // Conversion does not move returns
        let row = &report.returns[0];
        let expected = period_return(&raw, 30).unwrap();
        assert_relative_eq!(row.returns["1M"], (expected * 100.0).round() / 100.0);
        assert!(row.max_drawdown_pct.unwrap() <= 0.0);

        assert!(report.benchmarks.contains_key("SPY"));
        assert_relative_eq!(report.benchmarks["SPY"][0].1, 100.0);
        assert_eq!(report.missing, vec!["^GSPC".to_string()]);
        assert_eq!(report.rolling_volatility["AAA"].len(), raw.len() - 30);
    }

    #[tokio::test]
    async fn test_export_archive() {
        let pipeline = PortfolioPipeline::new(gateway(aaa_fundamentals()));
        let bytes = pipeline.export(&session()).await.unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 4);

        let mut read = |name: &str| {
            let mut content = String::new();
            archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
            content
        };

        // BBB has no data but still gets a fundamentals row
        let fundamentals = read("portfolio_report/Fundamentals.csv");
        assert_eq!(fundamentals.lines().count(), 3);

        let year = pipeline.data().history("AAA", HistoryPeriod::Years(1)).await;
        let technicals = read("portfolio_report/Technicals.csv");
        assert_eq!(technicals.lines().count(), year.len() + 1);

        let input = read("portfolio_report/Original Input.csv");
        assert_eq!(input, "ticker,quantity\nAAA,10.0\nBBB,5.0\n");

        let summary = read("portfolio_summary.txt");
        assert!(summary.contains("AAA | Sector: Technology | P/E: 25.0 | Yield: 1.50%"));
        assert!(summary.contains("BBB | Sector: N/A | P/E: N/A | Yield: 0.00%"));
    }

    #[tokio::test]
    async fn test_reports_serialize_with_cli_keys() {
        let pipeline = PortfolioPipeline::new(gateway(aaa_fundamentals()));
        let valuation = pipeline.value(&session().valid_holdings()).await.unwrap();

        let changes = pipeline.price_changes(&valuation, ReturnPeriod::OneWeek).await;
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["period"], "OneWeek");
        let row = &json["rows"][0];
        assert_eq!(row["ticker"], "AAA");
        for key in [
            "price",
            "one_day_pct",
            "one_week_pct",
            "one_month_pct",
            "volatility_30d_pct",
            "max_drawdown_90d_pct",
            "from_52w_high_pct",
            "rsi",
            "selected_pct",
        ] {
            assert!(row.get(key).is_some(), "missing {}", key);
        }
        assert!(json["normalized_history"]["AAA"][0][0].is_string());

        let start = as_of() - Duration::days(200);
        let report = pipeline.performance(&valuation, start, &["SPY".to_string()]).await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["start"], start.to_string());
        assert_eq!(json["fx_factors"]["AAA"], 1.0);
        assert_eq!(json["returns"][0]["ticker"], "AAA");
        assert!(json["returns"][0]["returns"].get("1M").is_some());
        assert!(json["benchmarks"].get("SPY").is_some());
        assert_eq!(json["missing"], serde_json::json!([]));

        let overview = serde_json::to_value(pipeline.run(&session()).await.unwrap()).unwrap();
        assert!(overview["risk"].get("Ok").is_some());
        assert_eq!(overview["target_risk"], "Moderate");
    }
}
