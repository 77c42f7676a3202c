use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Insufficient sample in {group}: {count} observations, at least 2 required")]
    InsufficientSample { group: String, count: u64 },

    #[error("Shape mismatch: {left} values vs {right} values")]
    ShapeMismatch { left: usize, right: usize },

    #[error("Degenerate variance: {0}")]
    DegenerateVariance(String),

    #[error("Degenerate ratio: {0}")]
    DegenerateRatio(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid column {column}: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl From<std::io::Error> for StatsError {
    fn from(e: std::io::Error) -> Self {
        StatsError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(e: serde_json::Error) -> Self {
        StatsError::Json(e.to_string())
    }
}

impl StatsError {
    /// Stable snake_case kind, for callers that branch on the failure class
    /// (e.g. "metric has no variation" vs "bad input").
    pub fn code(&self) -> &'static str {
        match self {
            StatsError::InsufficientSample { .. } => "insufficient_sample",
            StatsError::ShapeMismatch { .. } => "shape_mismatch",
            StatsError::DegenerateVariance(_) => "degenerate_variance",
            StatsError::DegenerateRatio(_) => "degenerate_ratio",
            StatsError::InvalidParameter(_) => "invalid_parameter",
            StatsError::ColumnNotFound(_) => "column_not_found",
            StatsError::InvalidColumn { .. } => "invalid_column",
            StatsError::Config(_) => "config_error",
            StatsError::Io(_) => "io_error",
            StatsError::Json(_) => "json_error",
        }
    }

    /// True for the numerically-degenerate conditions (zero variance, zero
    /// denominator mean) as opposed to malformed input.
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            StatsError::DegenerateVariance(_) | StatsError::DegenerateRatio(_)
        )
    }
}

/// Fails with `InvalidParameter` unless `value` lies strictly inside (0, 1).
pub(crate) fn check_open_unit(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(StatsError::InvalidParameter(format!(
            "{} must be in (0, 1), got {}",
            name, value
        )));
    }
    Ok(())
}

/// Fails with `InvalidParameter` when `value` is NaN or infinite.
pub(crate) fn check_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(StatsError::InvalidParameter(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    Ok(())
}
