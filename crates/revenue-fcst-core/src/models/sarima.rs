//! Seasonal ARIMA(1,1,1)(1,1,1)[7] candidate.
//!
//! The series is differenced once at lag 1 and once at the seasonal lag,
//! giving `w = (1 - B)(1 - B^s) y`. The multiplicative ARMA structure
//!
//! ```text
//! (1 - phi B)(1 - Phi B^s) w_t = (1 + theta B)(1 + Theta B^s) e_t
//! ```
//!
//! is estimated by minimising the conditional sum of squares with the
//! Nelder-Mead simplex. Forecasts set future innovations to zero and
//! integrate back through both differences.

use anofox_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};

use super::{ModelForecast, ModelName, WEEKLY_PERIOD};
use crate::error::FitFailure;

/// Minimum number of doubly-differenced observations required to fit.
const MIN_DIFFERENCED: usize = 16;

/// Number of estimated ARMA coefficients (phi, theta, Phi, Theta).
const N_COEFFICIENTS: usize = 4;

const COEFFICIENT_BOUND: f64 = 0.99;

/// AIC scale used to map information criterion onto confidence.
const AIC_SCALE: f64 = 10_000.0;
const MIN_CONFIDENCE: f64 = 0.70;
const MAX_CONFIDENCE: f64 = 0.95;

/// Fixed-order seasonal ARIMA model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalArima {
    period: usize,
    max_iter: usize,
    tolerance: f64,
}

/// Estimated seasonal ARIMA state, ready to project forward.
#[derive(Debug, Clone)]
pub struct SarimaFit {
    /// Non-seasonal AR coefficient.
    pub phi: f64,
    /// Non-seasonal MA coefficient.
    pub theta: f64,
    /// Seasonal AR coefficient.
    pub seasonal_phi: f64,
    /// Seasonal MA coefficient.
    pub seasonal_theta: f64,
    /// Innovation variance.
    pub sigma2: f64,
    /// Akaike information criterion.
    pub aic: f64,
    period: usize,
    original: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
}

impl SeasonalArima {
    /// ARIMA(1,1,1)(1,1,1)[7].
    pub fn weekly() -> Self {
        Self {
            period: WEEKLY_PERIOD,
            max_iter: 5000,
            tolerance: 1e-9,
        }
    }

    /// Largest lag in the ARMA recursion.
    fn max_lag(&self) -> usize {
        self.period + 1
    }

    pub fn fit(&self, values: &[f64]) -> Result<SarimaFit, FitFailure> {
        let needed = MIN_DIFFERENCED + self.max_lag();
        if values.len() < needed {
            return Err(FitFailure::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let differenced = seasonal_difference(&difference(values), self.period);

        let n = differenced.len() as f64;
        let mean = differenced.iter().sum::<f64>() / n;
        let variance = differenced.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / n;
        let level = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);
        if variance <= 1e-10 * level * level {
            return Err(FitFailure::InsufficientVariation);
        }

        let start = self.max_lag();
        let n_eff = (differenced.len() - start) as f64;
        let scale = n_eff * variance;

        let config = NelderMeadConfig {
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            initial_step: 0.1,
            ..Default::default()
        };
        let bounds = [(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); N_COEFFICIENTS];

        let result = nelder_mead(
            |params| {
                let css = conditional_residuals(&differenced, params, self.period, start).0;
                if css.is_finite() {
                    css / scale
                } else {
                    f64::MAX
                }
            },
            &[0.0; N_COEFFICIENTS],
            Some(&bounds[..]),
            config,
        );

        if !result.converged || !result.optimal_value.is_finite() {
            return Err(FitFailure::NonConvergence {
                iterations: result.iterations,
            });
        }

        let params = &result.optimal_point;
        let (css, residuals) = conditional_residuals(&differenced, params, self.period, start);
        let sigma2 = (css / n_eff).max(f64::EPSILON * variance);
        let log_likelihood =
            -0.5 * n_eff * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln());
        // Four ARMA coefficients plus the innovation variance
        let aic = -2.0 * log_likelihood + 2.0 * (N_COEFFICIENTS + 1) as f64;

        tracing::debug!(
            phi = params[0],
            theta = params[1],
            seasonal_phi = params[2],
            seasonal_theta = params[3],
            sigma2,
            aic,
            iterations = result.iterations,
            "fitted seasonal ARIMA"
        );

        Ok(SarimaFit {
            phi: params[0],
            theta: params[1],
            seasonal_phi: params[2],
            seasonal_theta: params[3],
            sigma2,
            aic,
            period: self.period,
            original: values.to_vec(),
            differenced,
            residuals,
        })
    }

    pub fn fit_and_forecast(
        &self,
        values: &[f64],
        horizon: usize,
    ) -> Result<ModelForecast, FitFailure> {
        let fit = self.fit(values)?;
        ModelForecast::new(ModelName::Sarima, fit.forecast(horizon), fit.confidence())
    }
}

impl SarimaFit {
    /// Confidence derived from the information criterion.
    pub fn confidence(&self) -> f64 {
        (1.0 - self.aic / AIC_SCALE).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    /// Recursive point forecasts on the original scale.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let s = self.period;
        let params = [self.phi, self.theta, self.seasonal_phi, self.seasonal_theta];

        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        let mut y = self.original.clone();

        for _ in 0..horizon {
            let t = w.len();
            let next_w = arma_prediction(&w, &e, &params, s, t);
            w.push(next_w);
            e.push(0.0);

            // Undo (1 - B)(1 - B^s)
            let t = y.len();
            let next_y = next_w + y[t - 1] + y[t - s] - y[t - s - 1];
            y.push(next_y);
        }

        y.split_off(self.original.len())
    }
}

/// One-step prediction of `w[t]` from its past and past innovations.
fn arma_prediction(w: &[f64], e: &[f64], params: &[f64], s: usize, t: usize) -> f64 {
    let (phi, theta, sphi, stheta) = (params[0], params[1], params[2], params[3]);
    phi * w[t - 1] + sphi * w[t - s] - phi * sphi * w[t - s - 1]
        + theta * e[t - 1]
        + stheta * e[t - s]
        + theta * stheta * e[t - s - 1]
}

/// Conditional sum of squares and residual vector for the given coefficients.
///
/// Innovations before `start` are taken as zero.
fn conditional_residuals(w: &[f64], params: &[f64], s: usize, start: usize) -> (f64, Vec<f64>) {
    let mut residuals = vec![0.0; w.len()];
    let mut css = 0.0;
    for t in start..w.len() {
        let error = w[t] - arma_prediction(w, &residuals, params, s, t);
        residuals[t] = error;
        css += error * error;
    }
    (css, residuals)
}

fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

fn seasonal_difference(values: &[f64], period: usize) -> Vec<f64> {
    values
        .iter()
        .skip(period)
        .zip(values.iter())
        .map(|(current, lagged)| current - lagged)
        .collect()
}
