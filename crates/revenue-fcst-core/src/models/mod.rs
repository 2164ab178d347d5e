//! Candidate forecasting models.
//!
//! Every candidate implements the same fit-and-forecast contract over a
//! prepared [`DailySeries`]: it either returns a complete [`ModelForecast`]
//! or a [`FitFailure`], never a partial result.

pub mod holt_winters;
pub mod moving_average;
pub mod regression;
pub mod sarima;

use crate::error::FitFailure;
use crate::series::DailySeries;

/// Seasonal period shared by all periodic candidates (weekly).
pub const WEEKLY_PERIOD: usize = 7;

/// Tag identifying which candidate produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelName {
    Sarima,
    ExponentialSmoothing,
    LinearRegression,
    SimpleMovingAverage,
}

impl ModelName {
    /// Name used in `models_used` on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ModelName::Sarima => "SARIMA",
            ModelName::ExponentialSmoothing => "ExponentialSmoothing",
            ModelName::LinearRegression => "LinearRegression",
            ModelName::SimpleMovingAverage => "SimpleMovingAverage",
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of a single successful candidate fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    model: ModelName,
    values: Vec<f64>,
    confidence: f64,
}

impl ModelForecast {
    /// Build a forecast, rejecting non-finite values.
    pub fn new(
        model: ModelName,
        values: Vec<f64>,
        confidence: f64,
    ) -> std::result::Result<Self, FitFailure> {
        if values.iter().any(|v| !v.is_finite()) || !confidence.is_finite() {
            return Err(FitFailure::NonFiniteForecast);
        }
        Ok(Self {
            model,
            values,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    pub fn model(&self) -> ModelName {
        self.model
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn horizon(&self) -> usize {
        self.values.len()
    }
}

/// Tagged set of candidates, in the order the orchestrator runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateModel {
    SeasonalAutoregressive,
    ExponentialSmoothing,
    TrendSeasonalRegression,
    MovingAverageFallback,
}

impl CandidateModel {
    /// Candidates attempted unconditionally on every request.
    pub const PRIMARY: [CandidateModel; 3] = [
        CandidateModel::SeasonalAutoregressive,
        CandidateModel::ExponentialSmoothing,
        CandidateModel::TrendSeasonalRegression,
    ];

    pub fn model_name(&self) -> ModelName {
        match self {
            CandidateModel::SeasonalAutoregressive => ModelName::Sarima,
            CandidateModel::ExponentialSmoothing => ModelName::ExponentialSmoothing,
            CandidateModel::TrendSeasonalRegression => ModelName::LinearRegression,
            CandidateModel::MovingAverageFallback => ModelName::SimpleMovingAverage,
        }
    }

    /// Fit this candidate on `series` and project `horizon` days ahead.
    pub fn fit_and_forecast(
        &self,
        series: &DailySeries,
        horizon: usize,
    ) -> std::result::Result<ModelForecast, FitFailure> {
        match self {
            CandidateModel::SeasonalAutoregressive => {
                sarima::SeasonalArima::weekly().fit_and_forecast(series.values(), horizon)
            }
            CandidateModel::ExponentialSmoothing => {
                holt_winters::forecast_exponential_smoothing(series.values(), horizon)
            }
            CandidateModel::TrendSeasonalRegression => {
                regression::forecast_trend_seasonal(series, horizon)
            }
            CandidateModel::MovingAverageFallback => {
                moving_average::forecast_moving_average(series.values(), horizon)
            }
        }
    }
}
