use analysis_core::RiskLabel;

use crate::models::Guidance;

pub const ALIGNED_MESSAGE: &str = "Your portfolio risk is in line with your selected target.";

/// Recommendations for reaching `target` from a different portfolio label
pub fn recommendations(target: RiskLabel) -> &'static [&'static str] {
    match target {
        RiskLabel::Low => &[
            "Reduce exposure to high-beta or high-volatility stocks.",
            "Increase allocation to dividend-paying or value-oriented assets.",
            "Rebalance toward diversified, lower-risk sectors.",
        ],
        RiskLabel::Moderate => &[
            "Aim for a blend of growth and defensive stocks.",
            "Avoid clusters of speculative positions.",
        ],
        RiskLabel::High => &[
            "Increase allocation to high-growth, high-beta assets.",
            "Consider sector tilts toward technology or emerging markets.",
        ],
    }
}

pub fn guidance(portfolio: RiskLabel, target: RiskLabel) -> Guidance {
    if portfolio == target {
        return Guidance::Aligned {
            message: ALIGNED_MESSAGE.to_string(),
        };
    }

    Guidance::Misaligned {
        warning: format!(
            "Your portfolio risk does not match your selected target of '{}'.",
            target
        ),
        recommendations: recommendations(target).iter().map(|r| r.to_string()).collect(),
    }
}
