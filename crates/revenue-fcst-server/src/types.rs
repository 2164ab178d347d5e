//! JSON wire types for the HTTP boundary.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HORIZON_DAYS: i64 = 90;
pub const DEFAULT_HISTORICAL_DAYS: i64 = 180;

fn default_horizon_days() -> i64 {
    DEFAULT_HORIZON_DAYS
}

fn default_historical_days() -> i64 {
    DEFAULT_HISTORICAL_DAYS
}

fn default_true() -> bool {
    true
}

/// One dated revenue observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: String,
    pub revenue: f64,
}

/// Body of `POST /api/forecast/revenue`.
///
/// Day counts are signed so that out-of-range values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub tenant_id: String,
    pub historical_data: Vec<HistoricalPoint>,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,
    /// Advisory only, logged but not used for fitting
    #[serde(default = "default_historical_days")]
    pub historical_days: i64,
    #[serde(default = "default_true")]
    pub include_confidence_intervals: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBands {
    pub lower_80: Vec<f64>,
    pub upper_80: Vec<f64>,
    pub lower_95: Vec<f64>,
    pub upper_95: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    /// Sum over the whole horizon (the name is historical; it is not fixed to 90 days)
    pub total_90day: f64,
    pub daily_average: f64,
    pub projection_vs_current: f64,
}

/// Successful forecast response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast: Vec<f64>,
    pub dates: Vec<String>,
    pub confidence: f64,
    pub confidence_intervals: Option<ConfidenceBands>,
    pub models_used: Vec<String>,
    pub summary: ForecastSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub models_available: bool,
    pub service: String,
}
