//! Prediction bands from historical volatility.
//!
//! The same standard deviation is applied at every horizon step, so the
//! bands do not widen with forecast distance.

use statrs::statistics::Statistics;

/// z-multiplier for the 80% band.
pub const Z_80: f64 = 1.28;
/// z-multiplier for the 95% band.
pub const Z_95: f64 = 1.96;

/// Fraction of the series mean used as sigma when the series is flat.
const FLAT_SERIES_SIGMA_RATIO: f64 = 0.1;

/// 80% and 95% bands around a point forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceIntervals {
    pub lower_80: Vec<f64>,
    pub upper_80: Vec<f64>,
    pub lower_95: Vec<f64>,
    pub upper_95: Vec<f64>,
}

/// Sample standard deviation of the history, or 10% of its mean when flat.
pub fn historical_sigma(history: &[f64]) -> f64 {
    let sigma = history.iter().std_dev();
    if sigma.is_finite() && sigma > 0.0 {
        return sigma;
    }
    let mean = history.iter().mean();
    if mean.is_finite() {
        mean.abs() * FLAT_SERIES_SIGMA_RATIO
    } else {
        0.0
    }
}

/// Symmetric bands of `forecast ± z * sigma`.
pub fn confidence_intervals(forecast: &[f64], sigma: f64) -> ConfidenceIntervals {
    let band = |z: f64, sign: f64| -> Vec<f64> {
        forecast.iter().map(|v| v + sign * z * sigma).collect()
    };
    ConfidenceIntervals {
        lower_80: band(Z_80, -1.0),
        upper_80: band(Z_80, 1.0),
        lower_95: band(Z_95, -1.0),
        upper_95: band(Z_95, 1.0),
    }
}
