//! Mapping of forecast failures onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use revenue_fcst_core::ForecastError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Forecast worker failed: {0}")]
    Worker(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Forecast(ForecastError::InsufficientHistory { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forecast(
                ForecastError::InvalidInput(_)
                | ForecastError::InvalidDateFormat(_)
                | ForecastError::InvalidParameter { .. },
            )
            | ApiError::MalformedBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Forecast(_) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Forecast(e) if !e.is_client_error() => {
                format!("Forecast generation failed: {}", e)
            }
            ApiError::Worker(_) => "Forecast generation failed: internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "forecast request failed");
        } else {
            tracing::info!(error = %self, status = status.as_u16(), "forecast request rejected");
        }

        let body = Json(json!({
            "detail": self.detail(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revenue_fcst_core::{FitFailure, ModelName};

    #[test]
    fn test_insufficient_history_is_bad_request() {
        let err = ApiError::from(ForecastError::InsufficientHistory { needed: 30, got: 3 });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.detail(),
            "Insufficient historical data. Need at least 30 days, got 3"
        );
    }

    #[test]
    fn test_validation_errors_are_unprocessable() {
        let errs = [
            ApiError::from(ForecastError::InvalidInput("x".into())),
            ApiError::from(ForecastError::InvalidDateFormat("x".into())),
            ApiError::from(ForecastError::InvalidParameter {
                param: "horizon_days".into(),
                value: "0".into(),
                reason: "must be at least 1".into(),
            }),
            ApiError::MalformedBody("missing field `tenant_id`".into()),
        ];
        for err in errs {
            assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn test_engine_failures_are_internal() {
        let errs = [
            ApiError::from(ForecastError::AllModelsFailed),
            ApiError::from(ForecastError::InternalError("boom".into())),
            ApiError::from(FitFailure::TimedOut.for_model(ModelName::Sarima)),
            ApiError::Worker("task panicked".into()),
        ];
        for err in errs {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(err.detail().starts_with("Forecast generation failed"));
        }
    }
}
