//! Daily series preparation.
//!
//! Turns an unordered list of dated revenue observations into a gap-free
//! daily series: same-day observations are summed and missing days are
//! filled with zero.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::error::{ForecastError, Result};

/// Minimum span, in days, before any candidate model is attempted.
pub const MIN_HISTORY_DAYS: usize = 30;

/// Default maximum span, in days, of a resampled history (about ten years).
pub const DEFAULT_MAX_HISTORY_DAYS: usize = 3660;

/// Largest absolute daily total accepted; keeps variance computations finite.
pub const MAX_DAILY_REVENUE: f64 = 1e15;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single dated revenue observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueRecord {
    pub date: NaiveDate,
    pub revenue: f64,
}

impl RevenueRecord {
    pub fn new(date: NaiveDate, revenue: f64) -> Self {
        Self { date, revenue }
    }

    /// Parse a record from its wire representation.
    ///
    /// Non-finite revenue is rejected here so that nothing downstream has to
    /// reason about NaN.
    pub fn parse(date: &str, revenue: f64) -> Result<Self> {
        if !revenue.is_finite() {
            return Err(ForecastError::InvalidInput(format!(
                "revenue for {} must be a finite number",
                date
            )));
        }
        Ok(Self::new(parse_date(date)?, revenue))
    }
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, or a timestamp whose calendar date is used.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(ForecastError::InvalidDateFormat(format!(
        "'{}' is not a valid date, expected YYYY-MM-DD",
        s
    )))
}

/// Format a date the way it appears on the wire.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Contiguous daily revenue series, one value per calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Resample raw records to daily granularity.
    ///
    /// Fails with [`ForecastError::InsufficientHistory`] when the span from the
    /// earliest to the latest date is shorter than [`MIN_HISTORY_DAYS`], and
    /// with [`ForecastError::InvalidParameter`] when it exceeds
    /// [`DEFAULT_MAX_HISTORY_DAYS`].
    pub fn prepare(records: &[RevenueRecord]) -> Result<Self> {
        Self::prepare_within(records, DEFAULT_MAX_HISTORY_DAYS)
    }

    /// Like [`DailySeries::prepare`], with an explicit upper bound on the span.
    pub fn prepare_within(records: &[RevenueRecord], max_span_days: usize) -> Result<Self> {
        let series = Self::resample(records, max_span_days)?;
        if series.len() < MIN_HISTORY_DAYS {
            return Err(ForecastError::InsufficientHistory {
                needed: MIN_HISTORY_DAYS,
                got: series.len(),
            });
        }
        Ok(series)
    }

    /// Resample without enforcing the minimum span.
    fn resample(records: &[RevenueRecord], max_span_days: usize) -> Result<Self> {
        let (Some(first), Some(last)) = (
            records.iter().map(|r| r.date).min(),
            records.iter().map(|r| r.date).max(),
        ) else {
            return Err(ForecastError::InsufficientHistory {
                needed: MIN_HISTORY_DAYS,
                got: 0,
            });
        };

        // Checked before allocating
        let span = (last - first).num_days().unsigned_abs() as usize + 1;
        if span > max_span_days {
            return Err(ForecastError::InvalidParameter {
                param: "historical_data".to_string(),
                value: format!("{} days", span),
                reason: format!(
                    "history from {} to {} exceeds the maximum of {} days",
                    format_date(first),
                    format_date(last),
                    max_span_days
                ),
            });
        }

        let mut values = vec![0.0; span];
        for record in records {
            if !record.revenue.is_finite() {
                return Err(ForecastError::InvalidInput(format!(
                    "revenue for {} must be a finite number",
                    format_date(record.date)
                )));
            }
            let idx = (record.date - first).num_days() as usize;
            values[idx] += record.revenue;
        }

        if let Some(idx) = values
            .iter()
            .position(|v| !v.is_finite() || v.abs() > MAX_DAILY_REVENUE)
        {
            return Err(ForecastError::InvalidInput(format!(
                "daily revenue for {} is out of range (limit {:e})",
                format_date(first + Duration::days(idx as i64)),
                MAX_DAILY_REVENUE
            )));
        }

        Ok(Self {
            start: first,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn last_date(&self) -> NaiveDate {
        self.date_at(self.values.len().saturating_sub(1))
    }

    /// Calendar date of the observation at `idx`.
    pub fn date_at(&self, idx: usize) -> NaiveDate {
        self.start + Duration::days(idx as i64)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.values.len()).map(|i| self.date_at(i))
    }

    /// The `horizon` consecutive dates following the last observation.
    ///
    /// `None` when the horizon runs past the last representable date.
    pub fn future_dates(&self, horizon: usize) -> Option<Vec<NaiveDate>> {
        let last = self.last_date();
        (1..=horizon)
            .map(|h| {
                let days = i64::try_from(h).ok()?;
                last.checked_add_signed(Duration::try_days(days)?)
            })
            .collect()
    }

    /// Mean of the most recent `window` observations.
    pub fn trailing_mean(&self, window: usize) -> f64 {
        let w = window.min(self.values.len());
        if w == 0 {
            return 0.0;
        }
        self.values.iter().rev().take(w).sum::<f64>() / w as f64
    }
}
