//! Conversion between wire types and core engine types.

use revenue_fcst_core::{
    format_date, ForecastError, ForecastOptions, Result, RevenueForecast, RevenueRecord,
};

use crate::config::ServerConfig;
use crate::types::{
    ConfidenceBands, ForecastRequest, ForecastResponse, ForecastSummary, HistoricalPoint,
};

/// Parse wire observations, rejecting bad dates and non-finite revenue.
pub fn to_records(points: &[HistoricalPoint]) -> Result<Vec<RevenueRecord>> {
    points
        .iter()
        .map(|p| RevenueRecord::parse(&p.date, p.revenue))
        .collect()
}

/// Validate request parameters and build per-call engine options.
pub fn to_options(request: &ForecastRequest, config: &ServerConfig) -> Result<ForecastOptions> {
    if request.tenant_id.trim().is_empty() {
        return Err(ForecastError::InvalidInput(
            "tenant_id must not be empty".to_string(),
        ));
    }

    let max = config.max_horizon_days;
    let horizon = usize::try_from(request.horizon_days)
        .ok()
        .filter(|h| (1..=max).contains(h))
        .ok_or_else(|| ForecastError::InvalidParameter {
            param: "horizon_days".to_string(),
            value: request.horizon_days.to_string(),
            reason: format!("must be between 1 and {}", max),
        })?;

    Ok(ForecastOptions {
        horizon,
        include_confidence_intervals: request.include_confidence_intervals,
        time_budget: config.time_budget,
        max_history_days: config.max_history_days,
    })
}

pub fn to_response(result: RevenueForecast) -> ForecastResponse {
    let RevenueForecast {
        dates,
        ensemble,
        summary,
    } = result;

    ForecastResponse {
        forecast: ensemble.values,
        dates: dates.into_iter().map(format_date).collect(),
        confidence: ensemble.confidence,
        confidence_intervals: ensemble.intervals.map(|ci| ConfidenceBands {
            lower_80: ci.lower_80,
            upper_80: ci.upper_80,
            lower_95: ci.lower_95,
            upper_95: ci.upper_95,
        }),
        models_used: ensemble
            .contributing_models
            .iter()
            .map(|m| m.name().to_string())
            .collect(),
        summary: ForecastSummary {
            total_90day: summary.total,
            daily_average: summary.daily_average,
            projection_vs_current: summary.projection_vs_current,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(horizon_days: i64) -> ForecastRequest {
        ForecastRequest {
            tenant_id: "acme".to_string(),
            historical_data: vec![],
            horizon_days,
            historical_days: 180,
            include_confidence_intervals: false,
        }
    }

    fn config() -> ServerConfig {
        ServerConfig {
            time_budget: Some(Duration::from_millis(500)),
            max_horizon_days: 365,
            max_history_days: 400,
            ..Default::default()
        }
    }

    #[test]
    fn test_to_options() {
        let opts = to_options(&request(30), &config()).unwrap();
        assert_eq!(opts.horizon, 30);
        assert!(!opts.include_confidence_intervals);
        assert_eq!(opts.time_budget, Some(Duration::from_millis(500)));
        assert_eq!(opts.max_history_days, 400);
    }

    #[test]
    fn test_horizon_bounds() {
        for bad in [0, -5, 366] {
            assert!(matches!(
                to_options(&request(bad), &config()),
                Err(ForecastError::InvalidParameter { .. })
            ));
        }
        assert!(to_options(&request(365), &config()).is_ok());
    }

    #[test]
    fn test_blank_tenant_rejected() {
        let mut req = request(7);
        req.tenant_id = "  ".to_string();
        assert!(matches!(
            to_options(&req, &config()),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_to_records() {
        let points = vec![
            HistoricalPoint {
                date: "2024-01-01".to_string(),
                revenue: 10.0,
            },
            HistoricalPoint {
                date: "2024-01-02T08:30:00".to_string(),
                revenue: -2.0,
            },
        ];
        let records = to_records(&points).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(format_date(records[1].date), "2024-01-02");

        let bad = vec![HistoricalPoint {
            date: "01/02/2024".to_string(),
            revenue: 1.0,
        }];
        assert!(matches!(
            to_records(&bad),
            Err(ForecastError::InvalidDateFormat(_))
        ));
    }
}
