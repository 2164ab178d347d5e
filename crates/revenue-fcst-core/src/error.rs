//! Error types for the revenue forecasting engine.

use thiserror::Error;

use crate::models::ModelName;

/// Result type for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error types surfaced by the forecasting pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    #[error("Insufficient historical data. Need at least {needed} days, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("{model} fitting failed: {reason}")]
    ModelFitting { model: ModelName, reason: FitFailure },

    #[error("All forecasting models failed, including the moving-average fallback")]
    AllModelsFailed,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ForecastError {
    /// Whether the error is caused by the caller's input rather than the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InvalidInput(_)
                | ForecastError::InvalidDateFormat(_)
                | ForecastError::InvalidParameter { .. }
                | ForecastError::InsufficientHistory { .. }
        )
    }
}

/// Why a single candidate model produced no forecast.
///
/// These never reach the caller directly: the orchestrator logs them and
/// drops the candidate from the ensemble.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitFailure {
    #[error("degenerate series: {0}")]
    DegenerateSeries(String),

    #[error("insufficient variation in the series")]
    InsufficientVariation,

    #[error("optimizer did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("singular or rank-deficient design: {0}")]
    SingularDesign(String),

    #[error("forecast contains non-finite values")]
    NonFiniteForecast,

    #[error("need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("exceeded the fitting time budget")]
    TimedOut,

    #[error("panicked while fitting: {0}")]
    Panicked(String),
}

impl FitFailure {
    /// Build a failure from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        FitFailure::Panicked(message)
    }

    /// Attach the failing model, producing a pipeline-level error.
    pub fn for_model(self, model: ModelName) -> ForecastError {
        ForecastError::ModelFitting {
            model,
            reason: self,
        }
    }
}
