//! Table-level entry points.
//!
//! [`Analyzer`] binds a distribution backend to an [`InferenceConfig`] and
//! runs the hypothesis tests directly on a [`Table`]: rows are split by a
//! binary group column, each arm is reduced to its summary, and the test is
//! run with `group_a = treatment` and `group_b = control`. It also corrects a
//! family of named results for multiple comparisons.

use serde::{Deserialize, Serialize};

use crate::config::InferenceConfig;
use crate::correction::benjamini_hochberg;
use crate::distributions::{Distributions, StatrsDistributions};
use crate::error::{Result, StatsError};
use crate::hypothesis::{sample_ratio_mismatch, ttest_delta_with, ttest_with, ztest_proportion_with};
use crate::mde::{mde_ratio_with, mde_with};
use crate::table::Table;
use crate::types::{
    GroupSummary, MdePoint, ProportionCounts, RatioSummary, SrmCheck, TestReport, TestResult,
};

const CONTROL: &str = "control";
const TREATMENT: &str = "treatment";

/// A test result labelled with the metric or hypothesis it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedResult {
    pub name: String,
    pub result: TestResult,
}

impl NamedResult {
    pub fn new(name: impl Into<String>, result: TestResult) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

/// A [`NamedResult`] after Benjamini-Hochberg correction across its family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectedResult {
    pub name: String,
    pub result: TestResult,
    pub adjusted_p: f64,
    pub reject_null: bool,
}

#[derive(Debug, Clone)]
pub struct Analyzer<D: Distributions = StatrsDistributions> {
    dist: D,
    config: InferenceConfig,
}

impl Analyzer<StatrsDistributions> {
    /// Analyzer on the statrs backend. Fails if `config` does not validate.
    pub fn new(config: InferenceConfig) -> Result<Self> {
        Self::with_backend(StatrsDistributions, config)
    }
}

impl Default for Analyzer<StatrsDistributions> {
    fn default() -> Self {
        Self {
            dist: StatrsDistributions,
            config: InferenceConfig::default(),
        }
    }
}

impl<D: Distributions> Analyzer<D> {
    pub fn with_backend(dist: D, config: InferenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { dist, config })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    // ── Hypothesis tests over tables ────────────────────────────────

    /// Welch's t-test of `metric` between the arms of `group_column`.
    pub fn ttest(
        &self,
        table: &Table,
        metric: &str,
        group_column: &str,
    ) -> Result<TestReport<GroupSummary>> {
        let partition = table.partition(group_column)?;
        let (control_values, treatment_values) = partition.split(&table.numeric(metric)?);

        let control = GroupSummary::from_sample_named(&control_values, CONTROL)?;
        let treatment = GroupSummary::from_sample_named(&treatment_values, TREATMENT)?;
        let result = ttest_with(&self.dist, &treatment, &control, self.config.alpha)?;

        tracing::info!(
            "[ANALYZE] ttest metric={} control_n={} treatment_n={} p={:.6}",
            metric,
            control.count,
            treatment.count,
            result.p_value
        );
        Ok(TestReport {
            result,
            control,
            treatment,
        })
    }

    /// Two-proportion z-test of a binary `outcome` column between the arms.
    pub fn ztest_proportion(
        &self,
        table: &Table,
        outcome: &str,
        group_column: &str,
    ) -> Result<TestReport<ProportionCounts>> {
        let partition = table.partition(group_column)?;
        let (control_outcomes, treatment_outcomes) = partition.split(&table.binary(outcome)?);

        let control = proportion_counts(&control_outcomes);
        let treatment = proportion_counts(&treatment_outcomes);
        let result = ztest_proportion_with(&self.dist, &treatment, &control, self.config.alpha)
            .map_err(relabel)?;

        tracing::info!(
            "[ANALYZE] ztest outcome={} control={}/{} treatment={}/{} p={:.6}",
            outcome,
            control.successes,
            control.trials,
            treatment.successes,
            treatment.trials,
            result.p_value
        );
        Ok(TestReport {
            result,
            control,
            treatment,
        })
    }

    /// Delta-method t-test of the ratio `numerator / denominator` between the
    /// arms.
    pub fn ttest_delta(
        &self,
        table: &Table,
        numerator: &str,
        denominator: &str,
        group_column: &str,
    ) -> Result<TestReport<RatioSummary>> {
        let partition = table.partition(group_column)?;
        let (control_num, treatment_num) = partition.split(&table.numeric(numerator)?);
        let (control_den, treatment_den) = partition.split(&table.numeric(denominator)?);

        let control = RatioSummary::from_samples_named(&control_num, &control_den, CONTROL)?;
        let treatment =
            RatioSummary::from_samples_named(&treatment_num, &treatment_den, TREATMENT)?;
        let result = ttest_delta_with(&self.dist, &treatment, &control, self.config.alpha)?;

        tracing::info!(
            "[ANALYZE] ttest_delta ratio={}/{} control_n={} treatment_n={} p={:.6}",
            numerator,
            denominator,
            control.count(),
            treatment.count(),
            result.p_value
        );
        Ok(TestReport {
            result,
            control,
            treatment,
        })
    }

    /// Chi-squared check of the arm sizes in `group_column` against the
    /// expected treatment fraction, at the configured SRM threshold.
    pub fn srm(
        &self,
        table: &Table,
        group_column: &str,
        expected_treatment_fraction: f64,
    ) -> Result<SrmCheck> {
        let partition = table.partition(group_column)?;
        sample_ratio_mismatch(
            partition.control.len() as u64,
            partition.treatment.len() as u64,
            expected_treatment_fraction,
            self.config.srm_threshold,
        )
    }

    // ── Planning ────────────────────────────────────────────────────

    /// MDE table over the configured sample sizes.
    pub fn mde(&self, mean: f64, std: f64) -> Result<Vec<MdePoint>> {
        mde_with(
            &self.dist,
            mean,
            std,
            &self.config.sample_sizes,
            self.config.alpha,
            self.config.power,
        )
    }

    pub fn mde_ratio(&self, numerator: &[f64], denominator: &[f64]) -> Result<Vec<MdePoint>> {
        mde_ratio_with(
            &self.dist,
            numerator,
            denominator,
            &self.config.sample_sizes,
            self.config.alpha,
            self.config.power,
        )
    }

    // ── Multiple comparisons ────────────────────────────────────────

    /// Benjamini-Hochberg across `results` at the configured FDR level.
    /// Output order matches input order.
    pub fn correct(&self, results: &[NamedResult]) -> Result<Vec<CorrectedResult>> {
        let pvalues: Vec<f64> = results.iter().map(|r| r.result.p_value).collect();
        let records = benjamini_hochberg(&pvalues, self.config.fdr_alpha)?;

        let corrected: Vec<CorrectedResult> = results
            .iter()
            .zip(records)
            .map(|(named, record)| CorrectedResult {
                name: named.name.clone(),
                result: named.result.clone(),
                adjusted_p: record.adjusted_p,
                reject_null: record.reject_null,
            })
            .collect();

        tracing::info!(
            "[ANALYZE] corrected {} results, {} rejected at fdr_alpha={}",
            corrected.len(),
            corrected.iter().filter(|r| r.reject_null).count(),
            self.config.fdr_alpha
        );
        Ok(corrected)
    }
}

fn proportion_counts(outcomes: &[bool]) -> ProportionCounts {
    ProportionCounts {
        successes: outcomes.iter().filter(|&&o| o).count() as u64,
        trials: outcomes.len() as u64,
    }
}

/// The z-test names its arms `group_a`/`group_b`; at table level those are
/// the treatment and control arms.
fn relabel(err: StatsError) -> StatsError {
    match err {
        StatsError::InsufficientSample { group, count } => StatsError::InsufficientSample {
            group: match group.as_str() {
                "group_a" => TREATMENT.to_string(),
                "group_b" => CONTROL.to_string(),
                _ => group,
            },
            count,
        },
        other => other,
    }
}
