use analysis_core::RiskLabel;

use crate::models::RiskFeatures;

pub const HIGH_VOLATILITY: f64 = 0.35;
pub const HIGH_BETA: f64 = 1.2;
pub const HIGH_PE: f64 = 30.0;
pub const LOW_DIVIDEND_YIELD_PCT: f64 = 1.0;

/// Rule score: +2 for high volatility or beta, +1 for a rich P/E, +1 for a thin yield.
pub fn heuristic_score(f: &RiskFeatures) -> u8 {
    let mut score = 0;
    if f.volatility > HIGH_VOLATILITY || f.beta > HIGH_BETA {
        score += 2;
    }
    if f.pe_ratio > HIGH_PE {
        score += 1;
    }
    if f.dividend_yield_pct < LOW_DIVIDEND_YIELD_PCT {
        score += 1;
    }
    score
}

pub fn heuristic_label(f: &RiskFeatures) -> RiskLabel {
    match heuristic_score(f) {
        s if s >= 3 => RiskLabel::High,
        2 => RiskLabel::Moderate,
        _ => RiskLabel::Low,
    }
}
