//! Holt-Winters exponential smoothing candidate.
//!
//! Fits an additive-trend model with weekly seasonality. Three seasonal
//! configurations are tried in priority order and the first that fits wins:
//! additive seasonal, multiplicative seasonal, then no seasonal component.

use anofox_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};

use super::{ModelForecast, ModelName, WEEKLY_PERIOD};
use crate::error::FitFailure;

/// Reported confidence for this model family, independent of fit quality.
pub const EXPONENTIAL_SMOOTHING_CONFIDENCE: f64 = 0.85;

const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Seasonal component of a Holt-Winters model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seasonality {
    Additive,
    Multiplicative,
    None,
}

impl Seasonality {
    /// Configurations in the order they are attempted.
    pub const FIT_ORDER: [Seasonality; 3] = [
        Seasonality::Additive,
        Seasonality::Multiplicative,
        Seasonality::None,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Seasonality::Additive => "additive",
            Seasonality::Multiplicative => "multiplicative",
            Seasonality::None => "none",
        }
    }

    fn is_seasonal(&self) -> bool {
        !matches!(self, Seasonality::None)
    }
}

/// Additive-trend Holt-Winters model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoltWinters {
    seasonality: Seasonality,
    period: usize,
}

/// Smoothing state after running through the whole series.
#[derive(Debug, Clone)]
pub struct HoltWintersFit {
    pub seasonality: Seasonality,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub level: f64,
    pub trend: f64,
    pub seasonals: Vec<f64>,
    pub sse: f64,
    n: usize,
}

#[derive(Debug, Clone)]
struct State {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
}

impl HoltWinters {
    pub fn new(seasonality: Seasonality, period: usize) -> Self {
        Self {
            seasonality,
            period: period.max(2),
        }
    }

    pub fn fit(&self, values: &[f64]) -> Result<HoltWintersFit, FitFailure> {
        self.validate(values)?;

        let initial = self.initial_state(values);
        let n_params = if self.seasonality.is_seasonal() { 3 } else { 2 };
        let bounds = vec![PARAM_BOUNDS; n_params];
        let config = NelderMeadConfig {
            max_iter: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| {
                let (sse, _) = self.run(values, &initial, params);
                if sse.is_finite() {
                    sse
                } else {
                    f64::MAX
                }
            },
            &[0.3, 0.1, 0.1][..n_params],
            Some(&bounds[..]),
            config,
        );

        let params: Vec<f64> = result
            .optimal_point
            .iter()
            .map(|p| p.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1))
            .collect();
        let (sse, state) = self.run(values, &initial, &params);

        let state_is_finite = state.level.is_finite()
            && state.trend.is_finite()
            && state.seasonals.iter().all(|s| s.is_finite());
        if !sse.is_finite() || !state_is_finite {
            return Err(FitFailure::NonFiniteForecast);
        }

        tracing::debug!(
            seasonality = self.seasonality.name(),
            alpha = params[0],
            beta = params[1],
            gamma = params.get(2).copied().unwrap_or(0.0),
            sse,
            "fitted Holt-Winters"
        );

        Ok(HoltWintersFit {
            seasonality: self.seasonality,
            alpha: params[0],
            beta: params[1],
            gamma: params.get(2).copied().unwrap_or(0.0),
            level: state.level,
            trend: state.trend,
            seasonals: state.seasonals,
            sse,
            n: values.len(),
        })
    }

    fn validate(&self, values: &[f64]) -> Result<(), FitFailure> {
        if values.iter().all(|v| *v == 0.0) {
            return Err(FitFailure::DegenerateSeries(
                "series is identically zero".to_string(),
            ));
        }
        let needed = if self.seasonality.is_seasonal() {
            2 * self.period
        } else {
            2
        };
        if values.len() < needed {
            return Err(FitFailure::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if self.seasonality == Seasonality::Multiplicative && values.iter().any(|v| *v <= 0.0) {
            return Err(FitFailure::DegenerateSeries(
                "multiplicative seasonality requires strictly positive values".to_string(),
            ));
        }
        Ok(())
    }

    /// Heuristic initial state.
    ///
    /// Seasonal models are initialised from the first two seasons, and the
    /// state is positioned at the end of the first season. The non-seasonal
    /// model starts from the first observation.
    fn initial_state(&self, values: &[f64]) -> State {
        if !self.seasonality.is_seasonal() {
            return State {
                level: values[0],
                trend: values[1] - values[0],
                seasonals: vec![],
            };
        }

        let m = self.period;
        let first = values[..m].iter().sum::<f64>() / m as f64;
        let second = values[m..2 * m].iter().sum::<f64>() / m as f64;
        let trend = (second - first) / m as f64;
        let center = (m - 1) as f64 / 2.0;

        let mut seasonals: Vec<f64> = values[..m]
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let baseline = first + (i as f64 - center) * trend;
                match self.seasonality {
                    Seasonality::Multiplicative => {
                        let baseline = if baseline > 0.0 { baseline } else { first };
                        y / baseline
                    }
                    _ => y - baseline,
                }
            })
            .collect();

        let mean = seasonals.iter().sum::<f64>() / m as f64;
        match self.seasonality {
            Seasonality::Multiplicative => seasonals.iter_mut().for_each(|s| *s /= mean),
            _ => seasonals.iter_mut().for_each(|s| *s -= mean),
        }

        State {
            level: first + center * trend,
            trend,
            seasonals,
        }
    }

    /// Run the smoothing recursions, returning one-step SSE and final state.
    fn run(&self, values: &[f64], initial: &State, params: &[f64]) -> (f64, State) {
        let alpha = params[0];
        let beta = params[1];
        let gamma = params.get(2).copied().unwrap_or(0.0);

        let mut state = initial.clone();
        let m = self.period;
        let start = if self.seasonality.is_seasonal() { m } else { 1 };
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate().skip(start) {
            let prev_level = state.level;
            let prev_trend = state.trend;
            match self.seasonality {
                Seasonality::Additive => {
                    let s = state.seasonals[t % m];
                    let pred = prev_level + prev_trend + s;
                    sse += (y - pred).powi(2);

                    state.level = alpha * (y - s) + (1.0 - alpha) * (prev_level + prev_trend);
                    state.trend = beta * (state.level - prev_level) + (1.0 - beta) * prev_trend;
                    state.seasonals[t % m] = gamma * (y - state.level) + (1.0 - gamma) * s;
                }
                Seasonality::Multiplicative => {
                    let s = state.seasonals[t % m];
                    let pred = (prev_level + prev_trend) * s;
                    sse += (y - pred).powi(2);

                    state.level = alpha * (y / s) + (1.0 - alpha) * (prev_level + prev_trend);
                    state.trend = beta * (state.level - prev_level) + (1.0 - beta) * prev_trend;
                    state.seasonals[t % m] = gamma * (y / state.level) + (1.0 - gamma) * s;
                }
                Seasonality::None => {
                    let pred = prev_level + prev_trend;
                    sse += (y - pred).powi(2);

                    state.level = alpha * y + (1.0 - alpha) * (prev_level + prev_trend);
                    state.trend = beta * (state.level - prev_level) + (1.0 - beta) * prev_trend;
                }
            }
        }

        (sse, state)
    }
}

impl HoltWintersFit {
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let m = self.seasonals.len();
        (1..=horizon)
            .map(|h| {
                let base = self.level + self.trend * h as f64;
                match self.seasonality {
                    Seasonality::Additive => base + self.seasonals[(self.n - 1 + h) % m],
                    Seasonality::Multiplicative => base * self.seasonals[(self.n - 1 + h) % m],
                    Seasonality::None => base,
                }
            })
            .collect()
    }
}

/// Fit the first configuration that succeeds and forecast with it.
pub fn forecast_exponential_smoothing(
    values: &[f64],
    horizon: usize,
) -> Result<ModelForecast, FitFailure> {
    let mut last_failure = FitFailure::DegenerateSeries("no configuration attempted".to_string());

    for seasonality in Seasonality::FIT_ORDER {
        let attempt = HoltWinters::new(seasonality, WEEKLY_PERIOD)
            .fit(values)
            .and_then(|fit| {
                ModelForecast::new(
                    ModelName::ExponentialSmoothing,
                    fit.forecast(horizon),
                    EXPONENTIAL_SMOOTHING_CONFIDENCE,
                )
            });

        match attempt {
            Ok(forecast) => return Ok(forecast),
            Err(failure) => {
                tracing::debug!(
                    seasonality = seasonality.name(),
                    %failure,
                    "Holt-Winters configuration failed, trying next"
                );
                last_failure = failure;
            }
        }
    }

    Err(last_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WEEK: [f64; 7] = [0.8, 0.9, 1.0, 1.0, 1.1, 1.3, 0.9];

    #[test]
    fn test_constant_series() {
        let values = vec![100.0; 35];
        let fit = HoltWinters::new(Seasonality::Additive, 7).fit(&values).unwrap();
        for v in fit.forecast(7) {
            assert_relative_eq!(v, 100.0, epsilon = 1e-6);
        }
        assert_relative_eq!(fit.sse, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_series_is_extrapolated() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + 10.0 * i as f64).collect();
        let fit = HoltWinters::new(Seasonality::Additive, 7).fit(&values).unwrap();
        let forecast = fit.forecast(5);
        for (h, v) in forecast.iter().enumerate() {
            assert_relative_eq!(*v, 500.0 + 10.0 * h as f64, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_additive_captures_weekly_pattern() {
        let values: Vec<f64> = (0..56).map(|t| 500.0 + 100.0 * WEEK[t % 7]).collect();
        let fit = HoltWinters::new(Seasonality::Additive, 7).fit(&values).unwrap();
        let forecast = fit.forecast(7);
        for (h, v) in forecast.iter().enumerate() {
            assert_relative_eq!(*v, 500.0 + 100.0 * WEEK[(56 + h) % 7], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_multiplicative_captures_weekly_pattern() {
        let values: Vec<f64> = (0..56).map(|t| 200.0 * WEEK[t % 7]).collect();
        let fit = HoltWinters::new(Seasonality::Multiplicative, 7)
            .fit(&values)
            .unwrap();
        let forecast = fit.forecast(7);
        for (h, v) in forecast.iter().enumerate() {
            assert_relative_eq!(*v, 200.0 * WEEK[(56 + h) % 7], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_multiplicative_requires_positive_values() {
        let mut values = vec![10.0; 30];
        values[3] = 0.0;
        assert!(matches!(
            HoltWinters::new(Seasonality::Multiplicative, 7).fit(&values),
            Err(FitFailure::DegenerateSeries(_))
        ));
    }

    #[test]
    fn test_seasonal_needs_two_seasons() {
        let values = vec![10.0; 10];
        assert_eq!(
            HoltWinters::new(Seasonality::Additive, 7)
                .fit(&values)
                .unwrap_err(),
            FitFailure::InsufficientData {
                needed: 14,
                got: 10
            }
        );
        assert!(HoltWinters::new(Seasonality::None, 7).fit(&values).is_ok());
    }

    #[test]
    fn test_zero_series_fails_every_configuration() {
        let values = vec![0.0; 30];
        assert!(matches!(
            forecast_exponential_smoothing(&values, 7),
            Err(FitFailure::DegenerateSeries(_))
        ));
    }

    #[test]
    fn test_fixed_confidence() {
        let values: Vec<f64> = (0..42).map(|t| 50.0 + (t % 5) as f64).collect();
        let fc = forecast_exponential_smoothing(&values, 30).unwrap();
        assert_eq!(fc.model(), ModelName::ExponentialSmoothing);
        assert_eq!(fc.horizon(), 30);
        assert_relative_eq!(fc.confidence(), EXPONENTIAL_SMOOTHING_CONFIDENCE);
    }
}
