//! Order-statistics helpers for outlier-resistant consensus values.
//!
//! These degrade gracefully: non-finite inputs are discarded and an empty
//! input yields `NaN` instead of panicking.

fn finite_sorted(xs: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = xs.iter().copied().filter(|x| x.is_finite()).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Median of the finite values in `xs`; `NaN` when there are none.
pub fn median(xs: &[f64]) -> f64 {
    let values = finite_sorted(xs);
    if values.is_empty() {
        return f64::NAN;
    }
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Mean after dropping `floor(n × trim_fraction)` values from each end.
///
/// The fraction is clamped to `[0, 0.5)` and at least one value always
/// survives, so tiny inputs drop nothing. `NaN` when no finite value exists.
pub fn trimmed_mean(xs: &[f64], trim_fraction: f64) -> f64 {
    let values = finite_sorted(xs);
    if values.is_empty() {
        return f64::NAN;
    }

    let fraction = if trim_fraction.is_finite() {
        trim_fraction.clamp(0.0, 0.4999)
    } else {
        0.0
    };
    let mut drop = (values.len() as f64 * fraction).floor() as usize;
    if 2 * drop >= values.len() {
        drop = (values.len() - 1) / 2;
    }

    let kept = &values[drop..values.len() - drop];
    kept.iter().sum::<f64>() / kept.len() as f64
}

/// Number of integers strictly between `a` and `b`, in either order.
///
/// An integer endpoint is a push rather than a win, so it is not counted.
pub fn count_integers(a: f64, b: f64) -> u32 {
    if !a.is_finite() || !b.is_finite() {
        return 0;
    }
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let first = lo.floor() + 1.0;
    let last = hi.ceil() - 1.0;
    if last < first {
        0
    } else {
        (last - first) as u32 + 1
    }
}
