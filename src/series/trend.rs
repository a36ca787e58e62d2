/// Number of most recent points the trend is estimated over.
pub const TREND_SAMPLE_LEN: usize = 10;

/// Mean first difference over the last `min(TREND_SAMPLE_LEN, len)` points.
///
/// Positive values mean an upward bias, negative a downward one. Fewer than two
/// samples (or a non-finite result) yields `0.0`, the flat default.
pub fn estimate(samples: &[f64]) -> f64 {
    estimate_over(samples, TREND_SAMPLE_LEN)
}

/// Same as [`estimate`] with an explicit sample window.
pub fn estimate_over(samples: &[f64], window: usize) -> f64 {
    let n = window.min(samples.len());
    if n < 2 {
        return 0.0;
    }
    let recent = &samples[samples.len() - n..];
    let total: f64 = recent.windows(2).map(|w| w[1] - w[0]).sum();
    let trend = total / (n - 1) as f64;
    if trend.is_finite() {
        trend
    } else {
        0.0
    }
}
