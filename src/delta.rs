//! Delta-method variance of a ratio metric.
//!
//! For paired per-unit observations (X_i, Y_i), e.g. clicks and searches per
//! user, the first-order Taylor expansion of X/Y around the means gives
//!
//! ```text
//! Var(X/Y) ≈ Var(X)/Ȳ² + X̄²·Var(Y)/Ȳ⁴ − 2·X̄·Cov(X,Y)/Ȳ³
//! ```
//!
//! Reference: Deng, Knoblich & Lu (2018), "Applying the Delta Method in Metric
//! Analytics".

use crate::error::{check_finite, Result, StatsError};
use crate::summary::covariance;
use crate::types::{GroupSummary, RatioSummary};

/// Approximate per-unit variance of `numerator / denominator`.
///
/// # Errors
///
/// [`StatsError::DegenerateRatio`] if the denominator mean is zero.
pub fn ratio_variance(
    numerator: &GroupSummary,
    denominator: &GroupSummary,
    covariance: f64,
) -> Result<f64> {
    check_finite("covariance", covariance)?;
    let mean_x = numerator.mean;
    let mean_y = denominator.mean;
    if mean_y == 0.0 {
        return Err(StatsError::DegenerateRatio(
            "denominator mean is zero".to_string(),
        ));
    }

    // Factored through the ratio so no term carries a fourth power of Ȳ:
    // (Var(X) − 2r·Cov(X,Y) + r²·Var(Y)) / Ȳ² with r = X̄/Ȳ.
    let ratio = mean_x / mean_y;
    let variance = (numerator.variance - 2.0 * ratio * covariance
        + ratio * ratio * denominator.variance)
        / mean_y
        / mean_y;

    if !variance.is_finite() {
        return Err(StatsError::DegenerateRatio(format!(
            "ratio variance is not representable (numerator mean {}, denominator mean {})",
            mean_x, mean_y
        )));
    }

    // The expansion is a variance of a linear combination and so is >= 0;
    // rounding can leave a tiny negative residue.
    Ok(variance.max(0.0))
}

impl RatioSummary {
    /// # Errors
    ///
    /// [`StatsError::ShapeMismatch`] if numerator and denominator counts
    /// differ, [`StatsError::DegenerateRatio`] if the denominator mean is zero.
    pub fn new(numerator: GroupSummary, denominator: GroupSummary, covariance: f64) -> Result<Self> {
        if numerator.count != denominator.count {
            return Err(StatsError::ShapeMismatch {
                left: numerator.count as usize,
                right: denominator.count as usize,
            });
        }
        check_finite("covariance", covariance)?;
        if denominator.mean == 0.0 {
            return Err(StatsError::DegenerateRatio(
                "denominator mean is zero".to_string(),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
            covariance,
        })
    }

    /// Summarize paired per-unit numerator and denominator observations.
    ///
    /// # Errors
    ///
    /// [`StatsError::ShapeMismatch`] if the lengths differ,
    /// [`StatsError::InsufficientSample`] with fewer than two pairs,
    /// [`StatsError::DegenerateRatio`] if the denominator mean is zero.
    pub fn from_samples(numerator: &[f64], denominator: &[f64]) -> Result<Self> {
        Self::from_samples_named(numerator, denominator, "ratio sample")
    }

    pub(crate) fn from_samples_named(
        numerator: &[f64],
        denominator: &[f64],
        group: &str,
    ) -> Result<Self> {
        if numerator.len() != denominator.len() {
            return Err(StatsError::ShapeMismatch {
                left: numerator.len(),
                right: denominator.len(),
            });
        }
        let num = GroupSummary::from_sample_named(numerator, group)?;
        let den = GroupSummary::from_sample_named(denominator, group)?;
        let cov = covariance(numerator, denominator)?;
        Self::new(num, den, cov)
    }

    pub fn count(&self) -> u64 {
        self.numerator.count
    }

    /// Ratio of means, X̄ / Ȳ.
    pub fn ratio(&self) -> f64 {
        self.numerator.mean / self.denominator.mean
    }

    /// Delta-method per-unit variance of the ratio.
    pub fn variance(&self) -> Result<f64> {
        ratio_variance(&self.numerator, &self.denominator, self.covariance)
    }

    /// Collapse to the (count, ratio, delta variance) triple consumed by the
    /// Welch machinery and the MDE calculator.
    pub fn to_group_summary(&self) -> Result<GroupSummary> {
        GroupSummary::new(self.count(), self.ratio(), self.variance()?)
    }
}
