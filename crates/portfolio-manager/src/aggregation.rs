use analysis_core::AnalysisError;
use std::collections::BTreeMap;

/// `Σ vᵢwᵢ / Σ wᵢ` over the pairs whose value is defined.
///
/// Undefined (or non-finite) values drop out together with their weight. Scaling every
/// weight by the same positive factor leaves the result unchanged.
pub fn weighted_average(values: &[Option<f64>], weights: &[f64]) -> Result<f64, AnalysisError> {
    if values.len() != weights.len() {
        return Err(AnalysisError::InvalidData(format!(
            "{} values for {} weights",
            values.len(),
            weights.len()
        )));
    }

    let mut num = 0.0;
    let mut den = 0.0;
    for (v, w) in values.iter().zip(weights.iter()) {
        if let Some(v) = v.filter(|v| v.is_finite()) {
            num += v * w;
            den += w;
        }
    }

    if den == 0.0 {
        return Err(AnalysisError::ZeroDenominator(
            "contributing weights sum to zero".to_string(),
        ));
    }
    Ok(num / den)
}

/// Sum `value_fn` per `key_fn` group
pub fn group_sum<T, K, KF, VF>(rows: &[T], key_fn: KF, value_fn: VF) -> BTreeMap<K, f64>
where
    K: Ord,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> f64,
{
    let mut groups = BTreeMap::new();
    for row in rows {
        *groups.entry(key_fn(row)).or_insert(0.0) += value_fn(row);
    }
    groups
}
