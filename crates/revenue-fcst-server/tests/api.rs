use approx::assert_relative_eq;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate};
use revenue_fcst_core::{ForecastOptions, RevenueRecord};
use revenue_fcst_server::{
    app, conversion, AppState, ForecastResponse, HealthResponse, ServerConfig,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

fn router() -> Router {
    app(AppState::new(ServerConfig {
        time_budget: None,
        ..Default::default()
    }))
}

fn history(start: &str, days: usize) -> Vec<Value> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    (0..days)
        .map(|i| {
            let weekly = [0.9, 1.0, 1.0, 1.05, 1.1, 1.3, 0.8][i % 7];
            let noise = ((i * 5 + 1) % 9) as f64 - 4.0;
            json!({
                "date": (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string(),
                "revenue": (800.0 + 3.0 * i as f64) * weekly + noise,
            })
        })
        .collect()
}

async fn post_json(router: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri("/api/forecast/revenue")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_endpoint_works() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.models_available);
    assert_eq!(health.service, "revenue-forecasting");
}

#[tokio::test]
async fn forecast_returns_full_response() {
    let body = json!({
        "tenant_id": "tenant-a",
        "historical_data": history("2024-01-01", 90),
        "horizon_days": 30,
    });
    let (status, value) = post_json(router(), body).await;
    assert_eq!(status, StatusCode::OK);

    let resp: ForecastResponse = serde_json::from_value(value).unwrap();
    assert_eq!(resp.forecast.len(), 30);
    assert_eq!(resp.dates.len(), 30);
    assert_eq!(resp.dates[0], "2024-03-31");
    assert_eq!(resp.dates[29], "2024-04-29");
    assert!(resp.forecast.iter().all(|v| *v >= 0.0));
    assert!((0.0..=1.0).contains(&resp.confidence));
    assert!(!resp.models_used.is_empty());

    let ci = resp.confidence_intervals.expect("intervals requested by default");
    for i in 0..30 {
        assert!(ci.lower_95[i] <= ci.lower_80[i]);
        assert!(ci.lower_80[i] <= resp.forecast[i]);
        assert!(resp.forecast[i] <= ci.upper_80[i]);
        assert!(ci.upper_80[i] <= ci.upper_95[i]);
    }
    assert_relative_eq!(
        resp.summary.total_90day,
        resp.forecast.iter().sum::<f64>(),
        epsilon = 1e-6
    );
}

#[tokio::test]
async fn intervals_can_be_omitted() {
    let body = json!({
        "tenant_id": "tenant-a",
        "historical_data": history("2024-01-01", 45),
        "horizon_days": 7,
        "include_confidence_intervals": false,
    });
    let (status, value) = post_json(router(), body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(value["confidence_intervals"].is_null());
}

#[tokio::test]
async fn default_horizon_is_ninety_days() {
    let body = json!({
        "tenant_id": "tenant-a",
        "historical_data": history("2024-01-01", 60),
    });
    let (status, value) = post_json(router(), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["forecast"].as_array().unwrap().len(), 90);
}

#[tokio::test]
async fn short_history_is_bad_request() {
    let body = json!({
        "tenant_id": "tenant-a",
        "historical_data": history("2024-01-01", 20),
    });
    let (status, value) = post_json(router(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        value["detail"],
        "Insufficient historical data. Need at least 30 days, got 20"
    );
    assert_eq!(value["status"], 400);
}

#[tokio::test]
async fn invalid_input_is_unprocessable() {
    let mut bad_date = history("2024-01-01", 40);
    bad_date[3]["date"] = json!("2024/01/04");

    let cases = vec![
        json!({"tenant_id": "t", "historical_data": bad_date}),
        json!({"tenant_id": "t", "historical_data": history("2024-01-01", 40), "horizon_days": 0}),
        json!({"tenant_id": "t", "historical_data": history("2024-01-01", 40), "horizon_days": 5000}),
        json!({"tenant_id": "", "historical_data": history("2024-01-01", 40)}),
        json!({"historical_data": history("2024-01-01", 40)}),
        json!({"tenant_id": "t", "historical_data": [{"date": "2024-01-01", "revenue": "lots"}]}),
    ];

    for body in cases {
        let (status, value) = post_json(router(), body.clone()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "body: {}", body);
        assert!(value["detail"].is_string());
    }
}

#[tokio::test]
async fn history_span_is_capped() {
    let body = json!({
        "tenant_id": "t",
        "historical_data": [
            {"date": "0001-01-01", "revenue": 1.0},
            {"date": "9999-12-31", "revenue": 1.0},
        ],
    });
    let (status, value) = post_json(router(), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(value["detail"]
        .as_str()
        .unwrap()
        .contains("exceeds the maximum of 3660 days"));

    let capped = app(AppState::new(ServerConfig {
        time_budget: None,
        max_history_days: 60,
        ..Default::default()
    }));
    let body = json!({"tenant_id": "t", "historical_data": history("2024-01-01", 90)});
    let (status, _) = post_json(capped, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn overflowing_daily_total_is_rejected() {
    let mut points = history("2024-01-01", 40);
    points.push(json!({"date": "2024-01-05", "revenue": 1e308}));
    points.push(json!({"date": "2024-01-05", "revenue": 1e308}));
    let (status, value) = post_json(router(), json!({"tenant_id": "t", "historical_data": points})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(value["detail"].as_str().unwrap().contains("2024-01-05"));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "https://dashboard.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn http_matches_core() {
    let points = history("2023-10-01", 120);
    let body = json!({
        "tenant_id": "tenant-b",
        "historical_data": points.clone(),
        "horizon_days": 45,
    });
    let (status, value) = post_json(router(), body).await;
    assert_eq!(status, StatusCode::OK);
    let http: ForecastResponse = serde_json::from_value(value).unwrap();

    // Re-parse so both paths see the same decoded floats
    let decoded: Vec<Value> = serde_json::from_slice(&serde_json::to_vec(&points).unwrap()).unwrap();
    let records: Vec<RevenueRecord> = decoded
        .iter()
        .map(|p| {
            RevenueRecord::parse(p["date"].as_str().unwrap(), p["revenue"].as_f64().unwrap())
                .unwrap()
        })
        .collect();
    let options = ForecastOptions {
        horizon: 45,
        ..Default::default()
    };
    let core = conversion::to_response(
        revenue_fcst_core::forecast_revenue(&records, &options).unwrap(),
    );

    assert_eq!(http.dates, core.dates);
    assert_eq!(http.models_used, core.models_used);
    assert_relative_eq!(http.confidence, core.confidence, epsilon = 1e-12);
    for (h, c) in http.forecast.iter().zip(&core.forecast) {
        assert_relative_eq!(*h, *c, epsilon = 1e-9, max_relative = 1e-9);
    }
    assert_relative_eq!(
        http.summary.projection_vs_current,
        core.summary.projection_vs_current,
        epsilon = 1e-9
    );
}
