use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{check_open_unit, Result, StatsError};

pub const ENV_ALPHA: &str = "ABTEST_ALPHA";
pub const ENV_POWER: &str = "ABTEST_POWER";
pub const ENV_FDR_ALPHA: &str = "ABTEST_FDR_ALPHA";

fn default_alpha() -> f64 {
    0.05
}

fn default_power() -> f64 {
    0.8
}

fn default_fdr_alpha() -> f64 {
    0.05
}

fn default_sample_sizes() -> Vec<u64> {
    vec![1_000, 5_000, 10_000, 50_000, 100_000]
}

fn default_srm_threshold() -> f64 {
    0.01
}

/// Engine-wide defaults for the significance level, target power, FDR level,
/// candidate per-arm sample sizes for MDE tables, and SRM threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_power")]
    pub power: f64,
    #[serde(default = "default_fdr_alpha")]
    pub fdr_alpha: f64,
    #[serde(default = "default_sample_sizes")]
    pub sample_sizes: Vec<u64>,
    #[serde(default = "default_srm_threshold")]
    pub srm_threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            power: default_power(),
            fdr_alpha: default_fdr_alpha(),
            sample_sizes: default_sample_sizes(),
            srm_threshold: default_srm_threshold(),
        }
    }
}

impl InferenceConfig {
    pub fn validate(&self) -> Result<()> {
        check_open_unit("alpha", self.alpha)?;
        check_open_unit("power", self.power)?;
        check_open_unit("fdrAlpha", self.fdr_alpha)?;
        check_open_unit("srmThreshold", self.srm_threshold)?;
        if self.sample_sizes.is_empty() {
            return Err(StatsError::InvalidParameter(
                "sampleSizes must not be empty".to_string(),
            ));
        }
        if self.sample_sizes.contains(&0) {
            return Err(StatsError::InvalidParameter(
                "sampleSizes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: InferenceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load from `path` if it exists and is valid, otherwise fall back to the
    /// defaults. Failures are logged, never returned.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match Self::load(path) {
                Ok(config) => {
                    tracing::info!(
                        "Loaded inference config from {}: alpha={} power={} fdr_alpha={}",
                        path.display(),
                        config.alpha,
                        config.power,
                        config.fdr_alpha
                    );
                    return config;
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to load inference config {}: {}, using defaults",
                        path.display(),
                        e
                    );
                }
            }
        } else {
            tracing::info!(
                "No inference config at {}, using defaults",
                path.display()
            );
        }
        Self::default()
    }

    /// Apply `ABTEST_ALPHA`, `ABTEST_POWER` and `ABTEST_FDR_ALPHA` overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = env_f64(ENV_ALPHA)? {
            self.alpha = v;
        }
        if let Some(v) = env_f64(ENV_POWER)? {
            self.power = v;
        }
        if let Some(v) = env_f64(ENV_FDR_ALPHA)? {
            self.fdr_alpha = v;
        }
        self.validate()?;
        Ok(self)
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| StatsError::Config(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        std::env::remove_var(ENV_ALPHA);
        std::env::remove_var(ENV_POWER);
        std::env::remove_var(ENV_FDR_ALPHA);
    }

    #[test]
    fn default_config_is_valid() {
        let c = InferenceConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.alpha, 0.05);
        assert_eq!(c.power, 0.8);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let c = InferenceConfig::from_json_str(r#"{"alpha": 0.01}"#).unwrap();
        assert_eq!(c.alpha, 0.01);
        assert_eq!(c.power, 0.8);
        assert_eq!(c.sample_sizes, default_sample_sizes());
    }

    #[test]
    fn config_uses_camel_case() {
        let c = InferenceConfig::from_json_str(r#"{"fdrAlpha": 0.1, "sampleSizes": [10, 20]}"#)
            .unwrap();
        assert_eq!(c.fdr_alpha, 0.1);
        assert_eq!(c.sample_sizes, vec![10, 20]);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("srmThreshold"));
        assert!(!json.contains("fdr_alpha"));
    }

    #[test]
    fn out_of_range_alpha_is_rejected() {
        let err = InferenceConfig::from_json_str(r#"{"alpha": 1.5}"#).unwrap_err();
        assert_eq!(err.code(), "invalid_parameter");
    }

    #[test]
    fn zero_sample_size_is_rejected() {
        assert!(InferenceConfig::from_json_str(r#"{"sampleSizes": [100, 0]}"#).is_err());
    }

    #[test]
    fn empty_sample_sizes_are_rejected() {
        let err = InferenceConfig::from_json_str(r#"{"sampleSizes": []}"#).unwrap_err();
        assert_eq!(err.code(), "invalid_parameter");
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = InferenceConfig::from_json_str("{alpha:").unwrap_err();
        assert_eq!(err.code(), "json_error");
    }

    #[test]
    fn load_reads_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"power": 0.9}}"#).unwrap();
        let c = InferenceConfig::load(f.path()).unwrap();
        assert_eq!(c.power, 0.9);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InferenceConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "io_error");
    }

    #[test]
    fn load_or_default_falls_back_on_invalid_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"power": 2.0}}"#).unwrap();
        assert_eq!(
            InferenceConfig::load_or_default(f.path()),
            InferenceConfig::default()
        );
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let c = InferenceConfig::load_or_default(&dir.path().join("inference.json"));
        assert_eq!(c, InferenceConfig::default());
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        clear_env();
        std::env::set_var(ENV_ALPHA, "0.01");
        std::env::set_var(ENV_FDR_ALPHA, " 0.1 ");
        let c = InferenceConfig::default().with_env_overrides().unwrap();
        clear_env();
        assert_eq!(c.alpha, 0.01);
        assert_eq!(c.power, 0.8);
        assert_eq!(c.fdr_alpha, 0.1);
    }

    #[test]
    #[serial]
    fn env_override_unparsable_is_config_error() {
        clear_env();
        std::env::set_var(ENV_POWER, "eighty");
        let err = InferenceConfig::default().with_env_overrides().unwrap_err();
        clear_env();
        assert_eq!(err.code(), "config_error");
    }

    #[test]
    #[serial]
    fn env_override_out_of_range_is_rejected() {
        clear_env();
        std::env::set_var(ENV_POWER, "1.0");
        let result = InferenceConfig::default().with_env_overrides();
        clear_env();
        assert!(result.is_err());
    }
}
