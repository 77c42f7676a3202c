//! Two-sample hypothesis tests.
//!
//! - [`ttest`]: Welch's t-test on group summaries (unequal variances).
//! - [`ztest_proportion`]: Wald two-proportion z-test, pooled under H0.
//! - [`ttest_delta`]: Welch's t-test on ratio metrics with delta-method
//!   variances.
//! - [`sample_ratio_mismatch`]: chi-squared check of the observed arm split.
//!
//! All tests are two-sided. Effects are reported as `a - b`, relative to `b`.

use crate::distributions::{chi_squared_survival, Distributions, StatrsDistributions};
use crate::error::{check_open_unit, Result, StatsError};
use crate::types::{GroupSummary, ProportionCounts, RatioSummary, SrmCheck, TestKind, TestResult};

// ── Welch's T-Test ──────────────────────────────────────────────────

/// Welch's t-test of `group_a` against `group_b`.
///
/// # Errors
///
/// [`StatsError::InsufficientSample`] if either group has fewer than two
/// observations; [`StatsError::DegenerateVariance`] if both groups have zero
/// variance but different means. Zero variance with equal means is a defined
/// result (statistic 0, p-value 1).
pub fn ttest(group_a: &GroupSummary, group_b: &GroupSummary, alpha: f64) -> Result<TestResult> {
    ttest_with(&StatrsDistributions, group_a, group_b, alpha)
}

pub fn ttest_with<D: Distributions + ?Sized>(
    dist: &D,
    group_a: &GroupSummary,
    group_b: &GroupSummary,
    alpha: f64,
) -> Result<TestResult> {
    welch(dist, group_a, group_b, alpha, TestKind::Welch)
}

/// Welch's t-test straight from raw observations.
pub fn ttest_samples(a: &[f64], b: &[f64], alpha: f64) -> Result<TestResult> {
    let group_a = GroupSummary::from_sample_named(a, "group_a")?;
    let group_b = GroupSummary::from_sample_named(b, "group_b")?;
    ttest(&group_a, &group_b, alpha)
}

fn welch<D: Distributions + ?Sized>(
    dist: &D,
    group_a: &GroupSummary,
    group_b: &GroupSummary,
    alpha: f64,
    test: TestKind,
) -> Result<TestResult> {
    check_open_unit("alpha", alpha)?;
    group_a.require_min_count("group_a")?;
    group_b.require_min_count("group_b")?;

    let var_a = group_a.mean_variance();
    let var_b = group_b.mean_variance();
    let se = (var_a + var_b).sqrt();
    let diff = group_a.mean - group_b.mean;
    let effect_relative = relative_pct(diff, group_b.mean);

    if se == 0.0 {
        if diff == 0.0 {
            tracing::warn!("[TTEST] both groups have zero variance and equal means");
            return Ok(TestResult {
                test,
                statistic: 0.0,
                degrees_of_freedom: None,
                p_value: 1.0,
                effect_absolute: 0.0,
                effect_relative,
                ci_lower: 0.0,
                ci_upper: 0.0,
                alpha,
                significant: false,
            });
        }
        return Err(StatsError::DegenerateVariance(format!(
            "both groups have zero variance but means differ by {}",
            diff
        )));
    }

    // Welch-Satterthwaite degrees of freedom, written in terms of each arm's
    // share of the pooled variance so neither se⁴ nor var² is formed.
    let w_a = var_a / (var_a + var_b);
    let w_b = 1.0 - w_a;
    let df = 1.0
        / (w_a * w_a / (group_a.count - 1) as f64 + w_b * w_b / (group_b.count - 1) as f64);

    let t = diff / se;
    let p_value = (2.0 * dist.student_t_survival(t.abs(), df)?).clamp(0.0, 1.0);
    let t_crit = dist.student_t_quantile(1.0 - alpha / 2.0, df)?;

    tracing::debug!(
        "[TTEST] kind={:?} t={:.6} df={:.3} p={:.6} diff={}",
        test,
        t,
        df,
        p_value,
        diff
    );

    Ok(TestResult {
        test,
        statistic: t,
        degrees_of_freedom: Some(df),
        p_value,
        effect_absolute: diff,
        effect_relative,
        ci_lower: diff - t_crit * se,
        ci_upper: diff + t_crit * se,
        alpha,
        significant: p_value < alpha,
    })
}

// ── Proportion Z-Test ───────────────────────────────────────────────

/// Wald z-test for the difference of two proportions. The statistic uses the
/// pooled rate; the confidence interval uses the unpooled standard error.
///
/// # Errors
///
/// [`StatsError::InsufficientSample`] if either arm has fewer than two
/// trials; [`StatsError::DegenerateVariance`] if the pooled rate is 0 or 1.
pub fn ztest_proportion(
    group_a: &ProportionCounts,
    group_b: &ProportionCounts,
    alpha: f64,
) -> Result<TestResult> {
    ztest_proportion_with(&StatrsDistributions, group_a, group_b, alpha)
}

pub fn ztest_proportion_with<D: Distributions + ?Sized>(
    dist: &D,
    group_a: &ProportionCounts,
    group_b: &ProportionCounts,
    alpha: f64,
) -> Result<TestResult> {
    check_open_unit("alpha", alpha)?;
    for (name, g) in [("group_a", group_a), ("group_b", group_b)] {
        if g.trials < 2 {
            return Err(StatsError::InsufficientSample {
                group: name.to_string(),
                count: g.trials,
            });
        }
        if g.successes > g.trials {
            return Err(StatsError::InvalidParameter(format!(
                "{}: successes ({}) exceed trials ({})",
                name, g.successes, g.trials
            )));
        }
    }

    let n_a = group_a.trials as f64;
    let n_b = group_b.trials as f64;
    let p_a = group_a.rate();
    let p_b = group_b.rate();
    let pooled = (group_a.successes + group_b.successes) as f64 / (n_a + n_b);

    let pooled_var = pooled * (1.0 - pooled) * (1.0 / n_a + 1.0 / n_b);
    if pooled_var <= 0.0 {
        return Err(StatsError::DegenerateVariance(format!(
            "pooled proportion is {}",
            pooled
        )));
    }

    let diff = p_a - p_b;
    let z = diff / pooled_var.sqrt();
    let p_value = (2.0 * dist.normal_survival(z.abs())?).clamp(0.0, 1.0);

    let se_unpooled = (p_a * (1.0 - p_a) / n_a + p_b * (1.0 - p_b) / n_b).sqrt();
    let z_crit = dist.normal_quantile(1.0 - alpha / 2.0)?;

    tracing::debug!(
        "[ZTEST] p_a={:.6} p_b={:.6} pooled={:.6} z={:.6} p={:.6}",
        p_a,
        p_b,
        pooled,
        z,
        p_value
    );

    Ok(TestResult {
        test: TestKind::ProportionZ,
        statistic: z,
        degrees_of_freedom: None,
        p_value,
        effect_absolute: diff,
        effect_relative: relative_pct(diff, p_b),
        ci_lower: diff - z_crit * se_unpooled,
        ci_upper: diff + z_crit * se_unpooled,
        alpha,
        significant: p_value < alpha,
    })
}

// ── Delta-Method Ratio T-Test ───────────────────────────────────────

/// Welch's t-test on two ratio metrics, each collapsed to (count, ratio of
/// means, delta-method variance).
pub fn ttest_delta(group_a: &RatioSummary, group_b: &RatioSummary, alpha: f64) -> Result<TestResult> {
    ttest_delta_with(&StatrsDistributions, group_a, group_b, alpha)
}

pub fn ttest_delta_with<D: Distributions + ?Sized>(
    dist: &D,
    group_a: &RatioSummary,
    group_b: &RatioSummary,
    alpha: f64,
) -> Result<TestResult> {
    let a = group_a.to_group_summary()?;
    let b = group_b.to_group_summary()?;
    welch(dist, &a, &b, alpha, TestKind::DeltaRatio)
}

// ── SRM Detection ───────────────────────────────────────────────────

/// Chi-squared goodness-of-fit test of the observed arm sizes against the
/// configured split. `mismatch` is set when the p-value falls below
/// `threshold` (0.01 is customary).
pub fn sample_ratio_mismatch(
    control_n: u64,
    treatment_n: u64,
    expected_treatment_fraction: f64,
    threshold: f64,
) -> Result<SrmCheck> {
    check_open_unit("expected_treatment_fraction", expected_treatment_fraction)?;
    check_open_unit("threshold", threshold)?;
    let total = control_n.checked_add(treatment_n).ok_or_else(|| {
        StatsError::InvalidParameter(format!(
            "arm sizes overflow: control={} treatment={}",
            control_n, treatment_n
        ))
    })?;
    if total == 0 {
        return Err(StatsError::InsufficientSample {
            group: "experiment".to_string(),
            count: 0,
        });
    }

    let expected_control = total as f64 * (1.0 - expected_treatment_fraction);
    let expected_treatment = total as f64 * expected_treatment_fraction;

    let chi_squared = (control_n as f64 - expected_control).powi(2) / expected_control
        + (treatment_n as f64 - expected_treatment).powi(2) / expected_treatment;
    let p_value = chi_squared_survival(chi_squared, 1.0)?;
    let mismatch = p_value < threshold;

    if mismatch {
        tracing::warn!(
            "[SRM] sample ratio mismatch: control={} treatment={} expected_fraction={} chi2={:.3} p={:.6}",
            control_n,
            treatment_n,
            expected_treatment_fraction,
            chi_squared,
            p_value
        );
    }

    Ok(SrmCheck {
        chi_squared,
        p_value,
        mismatch,
    })
}

fn relative_pct(diff: f64, baseline: f64) -> Option<f64> {
    if baseline != 0.0 {
        Some(diff / baseline * 100.0)
    } else {
        None
    }
}
