//! Per-feature normalization onto `[0, 1]`.
//!
//! Statistics come from the defined values of one column across the
//! surviving candidates. Null, NaN and infinite inputs take no part in the
//! statistics and come out as `NEUTRAL_SCORE`; they are never dropped.

use crate::config::{Bounds, NormalizationMethod};

/// The value every missing or degenerate feature resolves to.
pub const NEUTRAL_SCORE: f64 = 0.5;

fn finite(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().flatten().copied().filter(|v| v.is_finite())
}

fn min_max(values: &[Option<f64>]) -> (f64, f64) {
    finite(values).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn finite_or_neutral(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        NEUTRAL_SCORE
    }
}

/// Z-score normalization clipped to `[-t, t]` and mapped by `(z + t) / 2t`.
///
/// Uses the population standard deviation. A zero (or undefined) spread
/// gives every defined value `z = 0`, i.e. `NEUTRAL_SCORE`.
pub fn zscore_normalize(values: &[Option<f64>], outlier_threshold: f64) -> Vec<f64> {
    let n = finite(values).count();
    if n == 0 || outlier_threshold.is_nan() || outlier_threshold <= 0.0 {
        return vec![NEUTRAL_SCORE; values.len()];
    }

    // A constant column has zero spread even when the float mean is off by an ulp.
    let (min, max) = min_max(values);
    if min == max {
        return vec![NEUTRAL_SCORE; values.len()];
    }

    let mean = finite(values).sum::<f64>() / n as f64;
    let variance = finite(values).map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let std = variance.sqrt();
    let t = outlier_threshold;

    values
        .iter()
        .map(|value| match value {
            Some(x) if x.is_finite() => {
                if std <= 0.0 || !std.is_finite() {
                    return NEUTRAL_SCORE;
                }
                let z = ((x - mean) / std).clamp(-t, t);
                finite_or_neutral((z + t) / (2.0 * t))
            }
            _ => NEUTRAL_SCORE,
        })
        .collect()
}

/// Min-max normalization. A column whose values are all equal maps to
/// `NEUTRAL_SCORE`.
pub fn minmax_normalize(values: &[Option<f64>]) -> Vec<f64> {
    let (min, max) = min_max(values);
    let range = max - min;

    values
        .iter()
        .map(|value| match value {
            Some(x) if x.is_finite() => {
                if range <= 0.0 || !range.is_finite() {
                    return NEUTRAL_SCORE;
                }
                finite_or_neutral((x - min) / range)
            }
            _ => NEUTRAL_SCORE,
        })
        .collect()
}

/// Clamp a raw value into the configured bounds. Undefined values pass
/// through untouched.
pub fn clamp_to_bounds(value: Option<f64>, bounds: Option<&Bounds>) -> Option<f64> {
    match (value, bounds) {
        (Some(v), Some(b)) if v.is_finite() => Some(b.clamp(v)),
        _ => value,
    }
}

/// Normalize one feature column with the configured method.
pub fn normalize_column(
    values: &[Option<f64>],
    method: NormalizationMethod,
    outlier_threshold: f64,
) -> Vec<f64> {
    match method {
        NormalizationMethod::ZScore => zscore_normalize(values, outlier_threshold),
        NormalizationMethod::MinMax => minmax_normalize(values),
    }
}
