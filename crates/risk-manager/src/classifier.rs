use analysis_core::{AnalysisError, RiskLabel};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::forest::{ForestConfig, RandomForest};
use crate::guidance::guidance;
use crate::heuristic::heuristic_label;
use crate::models::{FeatureAverages, PortfolioRiskReport, RiskAssessment, RiskFeatures, RiskInput};

const SPOTLIGHT_COUNT: usize = 3;

/// Labels tickers with the rule heuristic, fits a random forest on those labels and
/// predicts the same rows back.
pub struct RiskClassifier {
    config: ForestConfig,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl RiskClassifier {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn classify(
        &self,
        inputs: &[RiskInput],
        target: RiskLabel,
    ) -> Result<PortfolioRiskReport, AnalysisError> {
        let mut rows = Vec::with_capacity(inputs.len());
        let mut dropped = Vec::new();
        for input in inputs {
            match RiskFeatures::from_input(input) {
                Some(f) => rows.push(f),
                None => dropped.push(input.ticker.clone()),
            }
        }

        if !dropped.is_empty() {
            tracing::warn!("Risk features incomplete for {:?}, leaving them out", dropped);
        }
        if rows.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "no ticker has a complete risk feature set".to_string(),
            ));
        }

        let heuristic: Vec<RiskLabel> = rows.iter().map(heuristic_label).collect();
        let matrix: Vec<Vec<f64>> = rows.iter().map(RiskFeatures::row).collect();
        let classes: Vec<usize> = heuristic.iter().map(RiskLabel::index).collect();

        let mut forest = RandomForest::new(self.config.clone());
        forest.fit(&matrix, &classes, RiskLabel::ALL.len());

        let predicted: Vec<RiskLabel> = match forest.predict(&matrix) {
            Some(classes) => classes
                .into_iter()
                .zip(&heuristic)
                .map(|(c, h)| RiskLabel::from_index(c).unwrap_or(*h))
                .collect(),
            None => heuristic.clone(),
        };

        let assessments: Vec<RiskAssessment> = rows
            .into_iter()
            .zip(heuristic)
            .zip(predicted)
            .map(|((features, heuristic), predicted)| RiskAssessment {
                features,
                heuristic,
                predicted,
            })
            .collect();

        let labels: Vec<RiskLabel> = assessments.iter().map(|a| a.predicted).collect();
        let portfolio_label = mode(&labels).ok_or_else(|| {
            AnalysisError::InsufficientData("no predicted labels".to_string())
        })?;

        tracing::info!(
            "Classified {} tickers, portfolio risk {} (target {})",
            assessments.len(),
            portfolio_label,
            target
        );

        Ok(PortfolioRiskReport {
            portfolio_label,
            target,
            guidance: guidance(portfolio_label, target),
            averages: averages(&assessments),
            composition: composition(&labels),
            safest: spotlight(&assessments, RiskLabel::Low, false),
            riskiest: spotlight(&assessments, RiskLabel::High, true),
            assessments,
            dropped,
        })
    }
}

/// Most frequent label; among equally frequent labels the one seen first wins.
pub fn mode(labels: &[RiskLabel]) -> Option<RiskLabel> {
    let counts = composition(labels);
    let max = counts.values().copied().max()?;
    labels.iter().copied().find(|l| counts.get(l) == Some(&max))
}

fn composition(labels: &[RiskLabel]) -> BTreeMap<RiskLabel, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(*label).or_insert(0) += 1;
    }
    counts
}

fn averages(assessments: &[RiskAssessment]) -> FeatureAverages {
    let column = |f: fn(&RiskFeatures) -> f64| assessments.iter().map(|a| f(&a.features)).mean();
    FeatureAverages {
        volatility: column(|f| f.volatility),
        beta: column(|f| f.beta),
        pe_ratio: column(|f| f.pe_ratio),
        dividend_yield_pct: column(|f| f.dividend_yield_pct),
    }
}

fn spotlight(assessments: &[RiskAssessment], label: RiskLabel, highest_first: bool) -> Vec<String> {
    let mut picked: Vec<&RiskAssessment> = assessments.iter().filter(|a| a.predicted == label).collect();
    picked.sort_by(|a, b| {
        let ord = a.features.volatility.total_cmp(&b.features.volatility);
        if highest_first {
            ord.reverse()
        } else {
            ord
        }
    });
    picked
        .into_iter()
        .take(SPOTLIGHT_COUNT)
        .map(|a| a.ticker().to_string())
        .collect()
}
