//! Recency-weighted and robust statistics over windowed samples.
//!
//! Every function here tolerates missing input: `None` and non-finite values are
//! dropped before anything is computed, and an all-missing input yields `None`
//! rather than a panic.

use std::collections::BTreeMap;

/// Observations younger than this many years get a boosted weight.
pub const RECENT_YEARS: i32 = 10;

/// Windows larger than this get their top 5% trimmed before averaging.
pub const TRIM_MIN_SAMPLES: usize = 20;

/// A single observed value tagged with the year it was recorded in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub year: i32,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(year: i32, value: Option<f64>) -> Self {
        Self { year, value }
    }
}

/// Weight for an observation `age` years older than the newest one.
///
/// | Age      | Weight            |
/// |----------|-------------------|
/// | 0        | 3.0               |
/// | 1..=9    | 3.0 - 0.2 * age   |
/// | >= 10    | 1.0               |
pub fn recency_weight(age: i32) -> f64 {
    if age < RECENT_YEARS {
        3.0 - 0.2 * f64::from(age.max(0))
    } else {
        1.0
    }
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation, `None` with fewer than two values.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Rounds to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Keeps only finite values.
pub fn present(values: impl IntoIterator<Item = Option<f64>>) -> Vec<f64> {
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

fn weighted_pairs(samples: &[Sample]) -> Vec<(f64, f64)> {
    let clean: Vec<(i32, f64)> = samples
        .iter()
        .filter_map(|s| s.value.filter(|v| v.is_finite()).map(|v| (s.year, v)))
        .collect();

    let Some(newest) = clean.iter().map(|(year, _)| *year).max() else {
        return Vec::new();
    };

    clean
        .into_iter()
        .map(|(year, value)| (value, recency_weight(newest - year)))
        .collect()
}

/// Recency-weighted mean of the non-missing samples.
pub fn weighted_mean(samples: &[Sample]) -> Option<f64> {
    let pairs = weighted_pairs(samples);
    if pairs.is_empty() {
        return None;
    }
    let weight_sum: f64 = pairs.iter().map(|(_, w)| w).sum();
    let total: f64 = pairs.iter().map(|(v, w)| v * w).sum();

    Some(total / weight_sum)
}

/// Recency-weighted standard deviation around the weighted mean.
pub fn weighted_std(samples: &[Sample]) -> Option<f64> {
    let pairs = weighted_pairs(samples);
    if pairs.is_empty() {
        return None;
    }
    let weight_sum: f64 = pairs.iter().map(|(_, w)| w).sum();
    let avg = pairs.iter().map(|(v, w)| v * w).sum::<f64>() / weight_sum;
    let variance = pairs
        .iter()
        .map(|(v, w)| w * (v - avg).powi(2))
        .sum::<f64>()
        / weight_sum;

    Some(variance.sqrt())
}

/// Recency-weighted plurality vote over categorical codes.
///
/// Ties go to the lowest code so repeated runs agree.
pub fn weighted_mode(samples: &[Sample]) -> Option<i64> {
    let mut votes: BTreeMap<i64, f64> = BTreeMap::new();
    for (value, weight) in weighted_pairs(samples) {
        *votes.entry(value as i64).or_default() += weight;
    }

    let mut winner: Option<(i64, f64)> = None;
    for (code, weight) in votes {
        match winner {
            Some((_, best)) if weight <= best => {}
            _ => winner = Some((code, weight)),
        }
    }

    winner.map(|(code, _)| code)
}

/// Plain median of the non-missing values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = present(values.iter().copied().map(Some));
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    let mut sorted = present(values.iter().copied().map(Some));
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = (sorted.len() - 1) as f64 * (pct.clamp(0.0, 100.0) / 100.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let fraction = rank - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}

/// Mean with storm outliers removed.
///
/// With more than [`TRIM_MIN_SAMPLES`] values, anything above the 95th percentile
/// is discarded first. Smaller windows get a plain mean.
pub fn trimmed_mean(values: &[f64]) -> Option<f64> {
    let clean = present(values.iter().copied().map(Some));
    if clean.is_empty() {
        return None;
    }
    if clean.len() <= TRIM_MIN_SAMPLES {
        return Some(mean(&clean));
    }

    let p95 = percentile(&clean, 95.0)?;
    let kept: Vec<f64> = clean.iter().copied().filter(|v| *v <= p95).collect();

    if kept.is_empty() {
        Some(mean(&clean))
    } else {
        Some(mean(&kept))
    }
}
