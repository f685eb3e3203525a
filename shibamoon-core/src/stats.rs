//! Trailing-window statistics used by the stability scores.
//!
//! All functions skip NaN (undefined warm-up) values and return `None` when
//! no defined values remain. Standard deviation is the sample estimator
//! (n - 1 denominator).

pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.len() < 2 {
        return None;
    }
    let m = defined.iter().sum::<f64>() / defined.len() as f64;
    let ss = defined.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Some((ss / (defined.len() - 1) as f64).sqrt())
}

/// std / mean. `None` when either is undefined or the mean is not positive.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m <= 0.0 {
        return None;
    }
    Some(sample_std(values)? / m)
}

/// max - min of the defined values.
pub fn range(values: &[f64]) -> Option<f64> {
    let mut defined = values.iter().copied().filter(|v| !v.is_nan()).peekable();
    defined.peek()?;
    let (lo, hi) = defined.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    Some(hi - lo)
}
