#[cfg(test)]
mod risk_classifier_tests {
    use crate::classifier::{mode, RiskClassifier};
    use crate::models::{Guidance, RiskInput};
    use analysis_core::{AnalysisError, RiskLabel};
    use approx::assert_relative_eq;

    fn input(ticker: &str, vol: f64, beta: f64, pe: f64, yield_pct: f64, stddev: f64) -> RiskInput {
        RiskInput {
            ticker: ticker.to_string(),
            volatility: Some(vol),
            beta: Some(beta),
            pe_ratio: Some(pe),
            dividend_yield_pct: yield_pct,
            price_stddev: Some(stddev),
        }
    }

    fn mixed_portfolio() -> Vec<RiskInput> {
        vec![
            input("TSLA", 0.55, 2.1, 70.0, 0.0, 25.0),
            input("NVDA", 0.48, 1.7, 55.0, 0.03, 18.0),
            input("AMZN", 0.32, 1.3, 45.0, 0.0, 9.0),
            input("AAPL", 0.24, 1.25, 31.0, 0.5, 7.0),
            input("KO", 0.12, 0.6, 24.0, 3.0, 2.0),
            input("JNJ", 0.14, 0.55, 16.0, 3.1, 3.5),
            input("PG", 0.13, 0.4, 25.0, 2.4, 4.0),
        ]
    }

    #[test]
    fn test_classify_mixed_portfolio() {
        let report = RiskClassifier::default()
            .classify(&mixed_portfolio(), RiskLabel::Moderate)
            .unwrap();

        assert_eq!(report.assessments.len(), 7);
        assert!(report.dropped.is_empty());
        assert_eq!(report.composition.values().sum::<usize>(), 7);

        // Heuristic labels follow the rule table
        let tsla = &report.assessments[0];
        assert_eq!(tsla.heuristic, RiskLabel::High);
        let ko = &report.assessments[4];
        assert_eq!(ko.heuristic, RiskLabel::Low);

        // The portfolio label is the mode of the predicted labels
        let predicted: Vec<RiskLabel> = report.assessments.iter().map(|a| a.predicted).collect();
        assert_eq!(Some(report.portfolio_label), mode(&predicted));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = RiskClassifier::default();
        let a = classifier.classify(&mixed_portfolio(), RiskLabel::High).unwrap();
        let b = classifier.classify(&mixed_portfolio(), RiskLabel::High).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let mut inputs = mixed_portfolio();
        inputs[1].beta = None;
        inputs[5].pe_ratio = Some(f64::NAN);

        let report = RiskClassifier::default().classify(&inputs, RiskLabel::Low).unwrap();
        assert_eq!(report.assessments.len(), 5);
        assert_eq!(report.dropped, vec!["NVDA".to_string(), "JNJ".to_string()]);
    }

    #[test]
    fn test_no_complete_rows_is_insufficient_data() {
        let mut only = input("AAA", 0.2, 1.0, 20.0, 1.0, 3.0);
        only.price_stddev = None;

        let err = RiskClassifier::default().classify(&[only], RiskLabel::Low).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
        assert!(RiskClassifier::default().classify(&[], RiskLabel::Low).is_err());
    }

    #[test]
    fn test_single_row_predicts_its_heuristic() {
        let report = RiskClassifier::default()
            .classify(&[input("KO", 0.12, 0.6, 24.0, 3.0, 2.0)], RiskLabel::Low)
            .unwrap();

        assert_eq!(report.portfolio_label, RiskLabel::Low);
        assert!(report.guidance.is_aligned());
        assert_eq!(report.safest, vec!["KO".to_string()]);
        assert!(report.riskiest.is_empty());
    }

    #[test]
    fn test_guidance_when_target_differs() {
        let inputs = vec![
            input("AAA", 0.50, 1.5, 40.0, 0.0, 10.0),
            input("BBB", 0.60, 1.8, 50.0, 0.2, 12.0),
        ];
        let report = RiskClassifier::default().classify(&inputs, RiskLabel::Low).unwrap();

        assert_eq!(report.portfolio_label, RiskLabel::High);
        match &report.guidance {
            Guidance::Misaligned { recommendations, .. } => assert_eq!(recommendations.len(), 3),
            other => panic!("expected misaligned guidance, got {:?}", other),
        }
        // Riskiest list is ordered by volatility, highest first
        assert_eq!(report.riskiest, vec!["BBB".to_string(), "AAA".to_string()]);
    }

    #[test]
    fn test_simple_averages() {
        let inputs = vec![
            input("AAA", 0.2, 1.0, 20.0, 1.0, 3.0),
            input("BBB", 0.4, 2.0, 40.0, 3.0, 5.0),
        ];
        let report = RiskClassifier::default().classify(&inputs, RiskLabel::Moderate).unwrap();

        assert_relative_eq!(report.averages.volatility, 0.3, epsilon = 1e-12);
        assert_relative_eq!(report.averages.beta, 1.5, epsilon = 1e-12);
        assert_relative_eq!(report.averages.pe_ratio, 30.0, epsilon = 1e-12);
        assert_relative_eq!(report.averages.dividend_yield_pct, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mode_tie_goes_to_first_seen() {
        use RiskLabel::*;
        assert_eq!(mode(&[Moderate, High, High, Moderate]), Some(Moderate));
        assert_eq!(mode(&[High, Low, Low]), Some(Low));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn test_report_serializes() {
        let report = RiskClassifier::default()
            .classify(&mixed_portfolio(), RiskLabel::Moderate)
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("composition").unwrap().is_object());
        assert!(json["guidance"]["status"].is_string());
    }
}
