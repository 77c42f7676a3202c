//! Minimum detectable effect and its inverse, the required sample size.
//!
//! Both come from the two-arm, equal-allocation power formula
//!
//! ```text
//! n = 2·σ²·(z_{1-α/2} + z_{power})² / δ²
//! ```
//!
//! solved either for δ (the MDE at a given per-arm `n`) or for `n`.

use crate::distributions::{Distributions, StatrsDistributions};
use crate::error::{check_finite, check_open_unit, Result, StatsError};
use crate::types::{MdePoint, RatioSummary};

/// MDE for a scalar metric with baseline `mean` and per-unit standard
/// deviation `std`, one point per requested per-arm sample size, in input
/// order.
pub fn mde(
    mean: f64,
    std: f64,
    sample_sizes: &[u64],
    alpha: f64,
    power: f64,
) -> Result<Vec<MdePoint>> {
    mde_with(&StatrsDistributions, mean, std, sample_sizes, alpha, power)
}

pub fn mde_with<D: Distributions + ?Sized>(
    dist: &D,
    mean: f64,
    std: f64,
    sample_sizes: &[u64],
    alpha: f64,
    power: f64,
) -> Result<Vec<MdePoint>> {
    check_finite("mean", mean)?;
    check_finite("std", std)?;
    if std < 0.0 {
        return Err(StatsError::InvalidParameter(format!(
            "std must be >= 0, got {}",
            std
        )));
    }
    check_sample_sizes(sample_sizes)?;
    let multiplier = z_multiplier(dist, alpha, power)?;

    if mean == 0.0 {
        tracing::warn!("[MDE] baseline mean is zero; relative MDE is undefined");
    }

    let variance = std * std;
    let points: Vec<MdePoint> = sample_sizes
        .iter()
        .map(|&n| {
            let absolute = multiplier * (2.0 * variance / n as f64).sqrt();
            let relative_pct = if mean != 0.0 {
                Some(absolute / mean * 100.0)
            } else {
                None
            };
            MdePoint {
                sample_size: n,
                absolute,
                relative_pct,
            }
        })
        .collect();

    tracing::debug!(
        "[MDE] mean={} std={} alpha={} power={} sizes={}",
        mean,
        std,
        alpha,
        power,
        points.len()
    );
    Ok(points)
}

/// MDE for a ratio metric from paired per-unit numerator and denominator
/// observations. The delta-method variance of the ratio stands in for σ² and
/// the ratio of means is the baseline.
pub fn mde_ratio(
    numerator: &[f64],
    denominator: &[f64],
    sample_sizes: &[u64],
    alpha: f64,
    power: f64,
) -> Result<Vec<MdePoint>> {
    mde_ratio_with(
        &StatrsDistributions,
        numerator,
        denominator,
        sample_sizes,
        alpha,
        power,
    )
}

pub fn mde_ratio_with<D: Distributions + ?Sized>(
    dist: &D,
    numerator: &[f64],
    denominator: &[f64],
    sample_sizes: &[u64],
    alpha: f64,
    power: f64,
) -> Result<Vec<MdePoint>> {
    let ratio = RatioSummary::from_samples(numerator, denominator)?;
    let variance = ratio.variance()?;
    tracing::debug!(
        "[MDE] ratio={} delta_variance={} n={}",
        ratio.ratio(),
        variance,
        ratio.count()
    );
    mde_with(
        dist,
        ratio.ratio(),
        variance.sqrt(),
        sample_sizes,
        alpha,
        power,
    )
}

/// Per-arm sample size needed to detect an absolute effect of `effect` on a
/// metric with per-unit standard deviation `std`.
pub fn required_sample_size(std: f64, effect: f64, alpha: f64, power: f64) -> Result<u64> {
    required_sample_size_with(&StatrsDistributions, std, effect, alpha, power)
}

pub fn required_sample_size_with<D: Distributions + ?Sized>(
    dist: &D,
    std: f64,
    effect: f64,
    alpha: f64,
    power: f64,
) -> Result<u64> {
    check_finite("std", std)?;
    check_finite("effect", effect)?;
    if std < 0.0 {
        return Err(StatsError::InvalidParameter(format!(
            "std must be >= 0, got {}",
            std
        )));
    }
    if effect == 0.0 {
        return Err(StatsError::InvalidParameter(
            "effect must be non-zero".to_string(),
        ));
    }
    let multiplier = z_multiplier(dist, alpha, power)?;

    let n = 2.0 * std * std * multiplier.powi(2) / effect.powi(2);
    Ok((n.ceil() as u64).max(1))
}

fn z_multiplier<D: Distributions + ?Sized>(dist: &D, alpha: f64, power: f64) -> Result<f64> {
    check_open_unit("alpha", alpha)?;
    check_open_unit("power", power)?;
    let z_alpha = dist.normal_quantile(1.0 - alpha / 2.0)?;
    let z_power = dist.normal_quantile(power)?;
    Ok(z_alpha + z_power)
}

fn check_sample_sizes(sample_sizes: &[u64]) -> Result<()> {
    if sample_sizes.is_empty() {
        return Err(StatsError::InvalidParameter(
            "at least one sample size is required".to_string(),
        ));
    }
    if sample_sizes.contains(&0) {
        return Err(StatsError::InvalidParameter(
            "sample sizes must be positive".to_string(),
        ));
    }
    Ok(())
}
