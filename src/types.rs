use serde::{Deserialize, Serialize};

use crate::error::{check_finite, Result, StatsError};

/// Count, mean and sample variance of one experiment group.
///
/// Built either from raw observations ([`GroupSummary::from_sample`]) or from a
/// pre-aggregated triple ([`GroupSummary::new`]). Never mutated after
/// construction; every test recomputes what it needs from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub count: u64,
    pub mean: f64,
    pub variance: f64,
}

impl GroupSummary {
    /// Build a summary from a pre-aggregated (count, mean, variance) triple.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidParameter`] if `mean` or `variance` is not
    /// finite, or if `variance` is negative.
    pub fn new(count: u64, mean: f64, variance: f64) -> Result<Self> {
        check_finite("mean", mean)?;
        check_finite("variance", variance)?;
        if variance < 0.0 {
            return Err(StatsError::InvalidParameter(format!(
                "variance must be >= 0, got {}",
                variance
            )));
        }
        Ok(Self {
            count,
            mean,
            variance,
        })
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Fails with `InsufficientSample` unless the group has at least two
    /// observations.
    pub fn require_min_count(&self, group: &str) -> Result<()> {
        if self.count < 2 {
            return Err(StatsError::InsufficientSample {
                group: group.to_string(),
                count: self.count,
            });
        }
        Ok(())
    }

    /// Variance of the group mean, `variance / count`. Callers must have
    /// checked `count > 0`.
    pub(crate) fn mean_variance(&self) -> f64 {
        self.variance / self.count as f64
    }
}

/// Paired numerator/denominator moments for a ratio metric (e.g. clicks per
/// search), plus their covariance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioSummary {
    pub numerator: GroupSummary,
    pub denominator: GroupSummary,
    pub covariance: f64,
}

/// Successes out of trials for one arm of a binary-outcome metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProportionCounts {
    pub successes: u64,
    pub trials: u64,
}

impl ProportionCounts {
    pub fn new(successes: u64, trials: u64) -> Result<Self> {
        if successes > trials {
            return Err(StatsError::InvalidParameter(format!(
                "successes ({}) exceed trials ({})",
                successes, trials
            )));
        }
        Ok(Self { successes, trials })
    }

    /// Observed success rate. Callers must have checked `trials > 0`.
    pub fn rate(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Welch,
    ProportionZ,
    DeltaRatio,
}

/// Outcome of a single two-sample test.
///
/// `effect_absolute` is `mean_a - mean_b`; `effect_relative` is that difference
/// as a percentage of `mean_b`, absent when `mean_b` is zero. Z-tests carry no
/// degrees of freedom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test: TestKind,
    pub statistic: f64,
    pub degrees_of_freedom: Option<f64>,
    pub p_value: f64,
    pub effect_absolute: f64,
    pub effect_relative: Option<f64>,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub alpha: f64,
    pub significant: bool,
}

/// Minimum detectable effect at one per-arm sample size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdePoint {
    pub sample_size: u64,
    pub absolute: f64,
    /// `absolute / mean * 100`; `None` when the baseline mean is zero.
    pub relative_pct: Option<f64>,
}

/// One hypothesis after Benjamini-Hochberg correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PValueRecord {
    pub original_index: usize,
    /// 1-based position in ascending p-value order.
    pub rank: usize,
    pub raw_p: f64,
    pub adjusted_p: f64,
    pub reject_null: bool,
}

/// A test result together with the per-group descriptive statistics it was
/// computed from. `S` is [`GroupSummary`] for mean and proportion tests and
/// [`RatioSummary`] for the delta-method test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport<S> {
    pub result: TestResult,
    pub control: S,
    pub treatment: S,
}

/// Chi-squared goodness-of-fit check of the observed arm split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrmCheck {
    pub chi_squared: f64,
    pub p_value: f64,
    pub mismatch: bool,
}
