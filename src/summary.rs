//! Reduction of raw observations to [`GroupSummary`] moments.

use crate::error::{Result, StatsError};
use crate::types::GroupSummary;

impl GroupSummary {
    /// Reduce raw observations to count, mean and sample variance (n - 1
    /// denominator).
    ///
    /// # Errors
    ///
    /// [`StatsError::InsufficientSample`] with fewer than two observations,
    /// [`StatsError::InvalidParameter`] if any observation is not finite.
    pub fn from_sample(values: &[f64]) -> Result<Self> {
        Self::from_sample_named(values, "sample")
    }

    pub(crate) fn from_sample_named(values: &[f64], group: &str) -> Result<Self> {
        let n = values.len();
        if n < 2 {
            return Err(StatsError::InsufficientSample {
                group: group.to_string(),
                count: n as u64,
            });
        }
        check_all_finite(values, group)?;

        let mean = mean(values);
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

        GroupSummary::new(n as u64, mean, variance)
    }
}

/// Sample covariance (n - 1 denominator) of two equally long sequences.
///
/// # Errors
///
/// [`StatsError::ShapeMismatch`] if the lengths differ,
/// [`StatsError::InsufficientSample`] with fewer than two pairs.
pub fn covariance(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(StatsError::ShapeMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(StatsError::InsufficientSample {
            group: "paired sample".to_string(),
            count: n as u64,
        });
    }
    check_all_finite(x, "paired sample")?;
    check_all_finite(y, "paired sample")?;

    let mean_x = mean(x);
    let mean_y = mean(y);
    let sum: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();
    Ok(sum / (n - 1) as f64)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn check_all_finite(values: &[f64], group: &str) -> Result<()> {
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(StatsError::InvalidParameter(format!(
            "{} contains a non-finite value at position {}",
            group, pos
        )));
    }
    Ok(())
}
