//! Confidence-weighted combination of candidate forecasts.

use crate::error::{ForecastError, Result};
use crate::intervals::ConfidenceIntervals;
use crate::models::{ModelForecast, ModelName};

/// Combined forecast across all successful candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleResult {
    /// Point forecast, one value per horizon day, never negative.
    pub values: Vec<f64>,
    /// Unweighted mean of the contributing confidences.
    pub confidence: f64,
    /// Contributing models in run order.
    pub contributing_models: Vec<ModelName>,
    /// Prediction bands, when requested.
    pub intervals: Option<ConfidenceIntervals>,
}

impl EnsembleResult {
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    pub fn with_intervals(mut self, intervals: ConfidenceIntervals) -> Self {
        self.intervals = Some(intervals);
        self
    }
}

/// Normalized weights, proportional to each forecast's confidence.
pub fn ensemble_weights(forecasts: &[ModelForecast]) -> Vec<f64> {
    let total: f64 = forecasts.iter().map(|f| f.confidence()).sum();
    if total <= 0.0 {
        let equal = 1.0 / forecasts.len().max(1) as f64;
        return vec![equal; forecasts.len()];
    }
    forecasts.iter().map(|f| f.confidence() / total).collect()
}

/// Merge candidate forecasts into a single ensemble.
///
/// A lone forecast passes through; several are averaged with weights
/// proportional to confidence. The reported confidence is the plain mean,
/// so a weak contributor lowers it even though it barely moves the values.
pub fn combine(forecasts: &[ModelForecast]) -> Result<EnsembleResult> {
    let first = forecasts.first().ok_or(ForecastError::AllModelsFailed)?;
    let horizon = first.horizon();

    if let Some(bad) = forecasts.iter().find(|f| f.horizon() != horizon) {
        return Err(ForecastError::InternalError(format!(
            "{} produced {} values, expected {}",
            bad.model(),
            bad.horizon(),
            horizon
        )));
    }

    let (values, confidence) = if forecasts.len() == 1 {
        (first.values().to_vec(), first.confidence())
    } else {
        let weights = ensemble_weights(forecasts);
        let mut values = vec![0.0; horizon];
        for (forecast, weight) in forecasts.iter().zip(&weights) {
            for (acc, v) in values.iter_mut().zip(forecast.values()) {
                *acc += weight * v;
            }
        }
        let confidence =
            forecasts.iter().map(|f| f.confidence()).sum::<f64>() / forecasts.len() as f64;
        (values, confidence)
    };

    Ok(EnsembleResult {
        values: values.into_iter().map(|v| v.max(0.0)).collect(),
        confidence: confidence.clamp(0.0, 1.0),
        contributing_models: forecasts.iter().map(|f| f.model()).collect(),
        intervals: None,
    })
}
