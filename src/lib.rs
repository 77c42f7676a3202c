//! Frequentist inference for A/B experiments.
//!
//! Planning: [`mde`], [`mde_ratio`] and [`required_sample_size`].
//! Testing: Welch's [`ttest`], the two-proportion [`ztest_proportion`] and the
//! delta-method [`ttest_delta`] for ratio metrics, plus the
//! [`sample_ratio_mismatch`] guard. Multiple comparisons:
//! [`benjamini_hochberg`].
//!
//! [`Analyzer`] runs the same tests on a columnar [`Table`] split by a binary
//! group column, using the defaults in [`InferenceConfig`].

pub mod analyzer;
pub mod config;
pub mod correction;
pub mod delta;
pub mod distributions;
pub mod error;
pub mod hypothesis;
pub mod mde;
pub mod summary;
pub mod table;
pub mod types;

pub use analyzer::{Analyzer, CorrectedResult, NamedResult};
pub use config::InferenceConfig;
pub use correction::benjamini_hochberg;
pub use delta::ratio_variance;
pub use distributions::{BuiltinDistributions, Distributions, StatrsDistributions};
pub use error::{Result, StatsError};
pub use hypothesis::{
    sample_ratio_mismatch, ttest, ttest_delta, ttest_delta_with, ttest_samples, ttest_with,
    ztest_proportion, ztest_proportion_with,
};
pub use mde::{mde, mde_ratio, mde_ratio_with, mde_with, required_sample_size};
pub use summary::covariance;
pub use table::{Column, GroupPartition, Table};
pub use types::{
    GroupSummary, MdePoint, PValueRecord, ProportionCounts, RatioSummary, SrmCheck, TestKind,
    TestReport, TestResult,
};
