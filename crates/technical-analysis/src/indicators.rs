use statrs::statistics::Statistics;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Fractional change between consecutive values, one per value after the first.
/// A zero base counts as no change, so the output stays aligned with the input dates.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Rolling sample standard deviation, one value per full window
pub fn rolling_std(data: &[f64], period: usize) -> Vec<f64> {
    if period < 2 || data.len() < period {
        return vec![];
    }

    data.windows(period).map(|w| w.iter().std_dev()).collect()
}

/// Relative Strength Index over closes.
///
/// Each value looks at the trailing `period` fractional changes:
/// `rs = sum(gains) / |sum(losses)|`, with `rs = 0` when the window has no losses.
pub fn rsi_values(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let changes = daily_returns(data);
    if changes.len() < period {
        return vec![];
    }

    changes
        .windows(period)
        .map(|w| {
            let gains: f64 = w.iter().filter(|&&c| c > 0.0).sum();
            let losses: f64 = w.iter().filter(|&&c| c < 0.0).sum::<f64>().abs();
            let rs = if losses > 0.0 { gains / losses } else { 0.0 };
            100.0 - (100.0 / (1.0 + rs))
        })
        .collect()
}

/// Right-align an indicator output with a series of `len` observations,
/// padding the warm-up period with `None`.
pub fn align(values: &[f64], len: usize) -> Vec<Option<f64>> {
    let offset = len.saturating_sub(values.len());
    let skip = values.len().saturating_sub(len);
    (0..len)
        .map(|i| {
            if i < offset {
                None
            } else {
                values.get(i - offset + skip).copied()
            }
        })
        .collect()
}
