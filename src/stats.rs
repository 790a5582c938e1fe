//! Small statistics helpers shared by classification and ranking.

use crate::error::{PlaceCoverError, Result};

/// Percentile of a value list with linear interpolation between ranks.
///
/// `p` is in [0, 100]. Fails on an empty list or an out-of-range `p`.
pub fn percentile(values: &[f64], p: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(PlaceCoverError::InvalidInput(
            "Cannot take a percentile of an empty list".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&p) {
        return Err(PlaceCoverError::InvalidInput(format!(
            "Percentile out of range [0, 100]: {}",
            p
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Ok(sorted[lower]);
    }

    let weight = rank - lower as f64;
    Ok(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// Percentile cut points for a list of probe positions.
///
/// The result is monotonically non-decreasing for any non-empty value list.
pub fn cut_points(values: &[f64], probes: &[f64]) -> Result<Vec<f64>> {
    probes.iter().map(|&p| percentile(values, p)).collect()
}

/// Mean of a value list; `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Threshold pair dividing a value list into three categories, taken at the
/// one-third and two-thirds ranks of the sorted list.
pub fn tertile_thresholds(values: &[f64]) -> Result<[f64; 2]> {
    if values.is_empty() {
        return Err(PlaceCoverError::InvalidInput(
            "Cannot derive thresholds from an empty list".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    Ok([sorted[n / 3], sorted[2 * n / 3]])
}
