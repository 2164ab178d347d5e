//! Linear trend regression with calendar seasonality.
//!
//! Design columns: a linear trend index, the day of month, and one
//! indicator per weekday. No separate intercept is fitted: the seven
//! weekday indicators already span a constant.

use anofox_regression::prelude::*;
use chrono::{Datelike, NaiveDate};

use super::{ModelForecast, ModelName};
use crate::error::FitFailure;
use crate::series::DailySeries;

const MIN_CONFIDENCE: f64 = 0.70;
const MAX_CONFIDENCE: f64 = 0.90;

/// Number of design columns: trend, day of month, seven weekday indicators.
pub const N_FEATURES: usize = 9;

/// Feature row for one calendar day at trend position `t`.
pub fn feature_row(t: usize, date: NaiveDate) -> [f64; N_FEATURES] {
    let mut row = [0.0; N_FEATURES];
    row[0] = t as f64;
    row[1] = date.day() as f64;
    row[2 + date.weekday().num_days_from_monday() as usize] = 1.0;
    row
}

/// Fitted regression coefficients and in-sample fit quality.
#[derive(Debug, Clone)]
pub struct RegressionFit {
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
}

impl RegressionFit {
    pub fn predict(&self, row: &[f64; N_FEATURES]) -> f64 {
        self.coefficients.iter().zip(row.iter()).map(|(b, x)| b * x).sum()
    }

    pub fn confidence(&self) -> f64 {
        self.r_squared.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

/// Fit ordinary least squares on the calendar design of `series`.
pub fn fit_trend_seasonal(series: &DailySeries) -> Result<RegressionFit, FitFailure> {
    let y = series.values();
    let n = y.len();
    if n < N_FEATURES {
        return Err(FitFailure::SingularDesign(format!(
            "{} observations for {} columns",
            n, N_FEATURES
        )));
    }

    let mean = y.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let level = y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);
    if ss_tot <= 1e-12 * level * level * n as f64 {
        return Err(FitFailure::InsufficientVariation);
    }

    let rows: Vec<[f64; N_FEATURES]> = series
        .dates()
        .enumerate()
        .map(|(t, date)| feature_row(t, date))
        .collect();

    let x_mat = faer::Mat::from_fn(n, N_FEATURES, |i, j| rows[i][j]);
    let y_col = faer::Col::from_fn(n, |i| y[i]);

    let fitted = OlsRegressor::builder()
        .with_intercept(false)
        .build()
        .fit(&x_mat, &y_col)
        .map_err(|e| FitFailure::SingularDesign(e.to_string()))?;

    let coeffs_col = fitted.coefficients();
    let coefficients: Vec<f64> = (0..coeffs_col.nrows()).map(|i| coeffs_col[i]).collect();
    if coefficients.len() != N_FEATURES || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(FitFailure::SingularDesign(
            "aliased or non-finite coefficients".to_string(),
        ));
    }

    let predictions = fitted.predict(&x_mat);
    let ss_res: f64 = (0..n).map(|i| (y[i] - predictions[i]).powi(2)).sum();
    let r_squared = 1.0 - ss_res / ss_tot;
    if !r_squared.is_finite() {
        return Err(FitFailure::NonFiniteForecast);
    }

    tracing::debug!(r_squared, trend = coefficients[0], "fitted trend regression");

    Ok(RegressionFit {
        coefficients,
        r_squared,
    })
}

/// Forecast by extending the calendar design past the last observation.
///
/// Weekday indicators come from the real calendar date of each future day.
pub fn forecast_trend_seasonal(
    series: &DailySeries,
    horizon: usize,
) -> Result<ModelForecast, FitFailure> {
    let fit = fit_trend_seasonal(series)?;
    let n = series.len();

    let dates = series.future_dates(horizon).ok_or_else(|| {
        FitFailure::DegenerateSeries("horizon extends past the supported calendar".to_string())
    })?;
    let values: Vec<f64> = dates
        .into_iter()
        .enumerate()
        .map(|(h, date)| fit.predict(&feature_row(n + h, date)).max(0.0))
        .collect();

    ModelForecast::new(ModelName::LinearRegression, values, fit.confidence())
}
