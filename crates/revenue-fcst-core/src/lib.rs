//! Core engine for daily revenue forecasting.
//!
//! A tenant's dated revenue history is aggregated into a contiguous daily
//! series, several statistical models are fitted independently, and the
//! survivors are blended into a confidence-weighted ensemble with
//! prediction bands and a short summary.

pub mod ensemble;
pub mod error;
pub mod forecast;
pub mod intervals;
pub mod models;
pub mod series;

// Re-exports for convenience
pub use ensemble::{combine, ensemble_weights, EnsembleResult};
pub use error::{FitFailure, ForecastError, Result};
pub use forecast::{
    forecast_revenue, forecast_series, run_candidates, ForecastOptions, RevenueForecast, Summary,
    DEFAULT_HORIZON_DAYS, TRAILING_WINDOW_DAYS,
};
pub use intervals::{confidence_intervals, historical_sigma, ConfidenceIntervals, Z_80, Z_95};
pub use models::{CandidateModel, ModelForecast, ModelName, WEEKLY_PERIOD};
pub use series::{
    format_date, parse_date, DailySeries, RevenueRecord, DEFAULT_MAX_HISTORY_DAYS,
    MAX_DAILY_REVENUE, MIN_HISTORY_DAYS,
};

/// Whether the statistical model suite is compiled in.
pub const MODELS_AVAILABLE: bool = true;
