//! Moving-average fallback with linear drift.
//!
//! Only consulted when every primary candidate failed. Given at least one
//! observation it always produces a forecast.

use super::{ModelForecast, ModelName};
use crate::error::FitFailure;

pub const MOVING_AVERAGE_CONFIDENCE: f64 = 0.75;

const MAX_WINDOW: usize = 30;
const MIN_WINDOW: usize = 7;

/// Window length: half the series capped at 30, but never below 7.
pub fn window_length(n: usize) -> usize {
    (n / 2).min(MAX_WINDOW).max(MIN_WINDOW)
}

pub fn forecast_moving_average(
    values: &[f64],
    horizon: usize,
) -> Result<ModelForecast, FitFailure> {
    let n = values.len();
    if n == 0 {
        return Err(FitFailure::InsufficientData { needed: 1, got: 0 });
    }

    let window = window_length(n);
    let w = window.min(n);
    let last_ma = values[n - w..].iter().sum::<f64>() / w as f64;
    let trend = if n >= window {
        (values[n - 1] - values[n - window]) / window as f64
    } else {
        0.0
    };

    let forecast = (0..horizon)
        .map(|i| last_ma + trend * (i + 1) as f64)
        .collect();

    ModelForecast::new(
        ModelName::SimpleMovingAverage,
        forecast,
        MOVING_AVERAGE_CONFIDENCE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_window_length() {
        assert_eq!(window_length(10), 7);
        assert_eq!(window_length(30), 15);
        assert_eq!(window_length(45), 22);
        assert_eq!(window_length(365), 30);
    }

    #[test]
    fn test_constant_series() {
        let fc = forecast_moving_average(&[42.0; 30], 5).unwrap();
        assert_eq!(fc.model(), ModelName::SimpleMovingAverage);
        assert_relative_eq!(fc.confidence(), 0.75);
        for v in fc.values() {
            assert_relative_eq!(*v, 42.0);
        }
    }

    #[test]
    fn test_linear_drift() {
        // window = 15, last 15 values are 15..=29 with mean 22
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let fc = forecast_moving_average(&values, 3).unwrap();

        // trend = (29 - 15) / 15
        let trend = 14.0 / 15.0;
        assert_relative_eq!(fc.values()[0], 22.0 + trend, epsilon = 1e-12);
        assert_relative_eq!(fc.values()[2], 22.0 + 3.0 * trend, epsilon = 1e-12);
    }

    #[test]
    fn test_short_series_has_no_drift() {
        let fc = forecast_moving_average(&[1.0, 2.0, 3.0], 2).unwrap();
        assert_relative_eq!(fc.values()[0], 2.0);
        assert_relative_eq!(fc.values()[1], 2.0);
    }

    #[test]
    fn test_empty_series() {
        assert!(forecast_moving_average(&[], 3).is_err());
    }
}
