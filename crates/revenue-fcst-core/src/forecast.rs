//! Forecast orchestration.
//!
//! Prepares the daily series, fits the candidate models, combines the
//! survivors, optionally attaches prediction bands and derives the summary.
//! Every call is self-contained: nothing is cached between requests.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::ensemble::{combine, EnsembleResult};
use crate::error::{FitFailure, ForecastError, Result};
use crate::intervals::{confidence_intervals, historical_sigma};
use crate::models::{CandidateModel, ModelForecast, ModelName};
use crate::series::{DailySeries, RevenueRecord, DEFAULT_MAX_HISTORY_DAYS};

/// Number of most recent actual days compared against the forecast.
pub const TRAILING_WINDOW_DAYS: usize = 7;

/// Default forecast horizon in days.
pub const DEFAULT_HORIZON_DAYS: usize = 90;

/// Per-call forecast options.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOptions {
    /// Number of days to forecast
    pub horizon: usize,
    /// Attach 80%/95% bands to the result
    pub include_confidence_intervals: bool,
    /// Wall-clock budget for candidate fitting (None = unbounded)
    pub time_budget: Option<Duration>,
    /// Longest accepted history span, in days, after resampling
    pub max_history_days: usize,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON_DAYS,
            include_confidence_intervals: true,
            time_budget: None,
            max_history_days: DEFAULT_MAX_HISTORY_DAYS,
        }
    }
}

impl ForecastOptions {
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter {
                param: "horizon_days".to_string(),
                value: self.horizon.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Scalar aggregates of the ensemble forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Sum of the forecast over the horizon
    pub total: f64,
    /// Mean forecast per day
    pub daily_average: f64,
    /// Percentage change of the daily average against the trailing actual average
    pub projection_vs_current: f64,
}

impl Summary {
    pub fn compute(forecast: &[f64], history: &DailySeries) -> Self {
        let total: f64 = forecast.iter().sum();
        let daily_average = if forecast.is_empty() {
            0.0
        } else {
            total / forecast.len() as f64
        };
        let recent = history.trailing_mean(TRAILING_WINDOW_DAYS);
        let projection_vs_current = if recent > 0.0 {
            (daily_average - recent) / recent * 100.0
        } else {
            0.0
        };
        Self {
            total,
            daily_average,
            projection_vs_current,
        }
    }
}

/// Complete output of one forecast request.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueForecast {
    /// Calendar dates of the forecast, starting the day after the last observation
    pub dates: Vec<NaiveDate>,
    pub ensemble: EnsembleResult,
    pub summary: Summary,
}

impl RevenueForecast {
    pub fn models_used(&self) -> &[ModelName] {
        &self.ensemble.contributing_models
    }
}

/// Forecast daily revenue from raw dated observations.
pub fn forecast_revenue(
    records: &[RevenueRecord],
    options: &ForecastOptions,
) -> Result<RevenueForecast> {
    options.validate()?;
    let series = DailySeries::prepare_within(records, options.max_history_days)?;
    forecast_series(series, options)
}

/// Forecast from an already prepared daily series.
pub fn forecast_series(series: DailySeries, options: &ForecastOptions) -> Result<RevenueForecast> {
    options.validate()?;
    let horizon = options.horizon;
    let dates = series
        .future_dates(horizon)
        .ok_or_else(|| ForecastError::InvalidParameter {
            param: "horizon_days".to_string(),
            value: horizon.to_string(),
            reason: format!(
                "forecast from {} extends past the supported calendar",
                series.last_date()
            ),
        })?;
    let series = Arc::new(series);

    let mut forecasts = run_candidates(
        &series,
        &CandidateModel::PRIMARY,
        horizon,
        options.time_budget,
    );

    if forecasts.is_empty() {
        tracing::info!("no primary model succeeded, using moving-average fallback");
        let fallback = CandidateModel::MovingAverageFallback;
        match fallback.fit_and_forecast(&series, horizon) {
            Ok(forecast) => forecasts.push(forecast),
            Err(failure) => {
                tracing::error!(model = %fallback.model_name(), %failure, "fallback model failed");
                return Err(ForecastError::AllModelsFailed);
            }
        }
    }

    let mut ensemble = combine(&forecasts)?;
    if options.include_confidence_intervals {
        let sigma = historical_sigma(series.values());
        let intervals = confidence_intervals(&ensemble.values, sigma);
        ensemble = ensemble.with_intervals(intervals);
    }

    let summary = Summary::compute(&ensemble.values, &series);

    tracing::info!(
        history_days = series.len(),
        horizon,
        models = ?ensemble.contributing_models,
        confidence = ensemble.confidence,
        total = summary.total,
        "forecast complete"
    );

    Ok(RevenueForecast {
        dates,
        ensemble,
        summary,
    })
}

type CandidateOutcome = std::result::Result<ModelForecast, FitFailure>;

/// Fit candidates on worker threads and keep the successes, in candidate order.
///
/// Candidates still running when the budget elapses count as failed; their
/// threads are left to finish and their output is discarded. Nothing is
/// collected once the deadline has passed, so a zero budget keeps no candidate
/// fitted on a worker thread.
pub fn run_candidates(
    series: &Arc<DailySeries>,
    candidates: &[CandidateModel],
    horizon: usize,
    time_budget: Option<Duration>,
) -> Vec<ModelForecast> {
    let deadline = time_budget.map(|budget| Instant::now() + budget);
    let (tx, rx) = mpsc::channel::<(usize, CandidateOutcome)>();
    let mut outcomes: Vec<Option<CandidateOutcome>> = vec![None; candidates.len()];

    for (idx, &candidate) in candidates.iter().enumerate() {
        let tx = tx.clone();
        let worker_series = Arc::clone(series);
        let spawned = thread::Builder::new()
            .name(format!("fit-{}", candidate.model_name()))
            .spawn(move || {
                let outcome = fit_guarded(candidate, &worker_series, horizon);
                let _ = tx.send((idx, outcome));
            });

        if let Err(e) = spawned {
            tracing::debug!(model = %candidate.model_name(), error = %e, "spawn failed, fitting inline");
            outcomes[idx] = Some(fit_guarded(candidate, series, horizon));
        }
    }
    drop(tx);

    while outcomes.iter().any(Option::is_none) {
        let received = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                rx.recv_timeout(remaining).ok()
            }
            None => rx.recv().ok(),
        };
        match received {
            Some((idx, outcome)) => outcomes[idx] = Some(outcome),
            None => break,
        }
    }

    candidates
        .iter()
        .zip(outcomes)
        .filter_map(|(candidate, outcome)| {
            match outcome.unwrap_or(Err(FitFailure::TimedOut)) {
                Ok(forecast) => Some(forecast),
                Err(failure) => {
                    tracing::warn!(
                        model = %candidate.model_name(),
                        %failure,
                        "model skipped"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Run one candidate, turning a panic into a failure.
fn fit_guarded(candidate: CandidateModel, series: &DailySeries, horizon: usize) -> CandidateOutcome {
    catch_unwind(AssertUnwindSafe(|| candidate.fit_and_forecast(series, horizon)))
        .unwrap_or_else(|payload| Err(FitFailure::from_panic(payload)))
}
