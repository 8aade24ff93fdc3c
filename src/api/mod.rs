use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    BacktestParams, BacktestSummary, HistoricalIndex, HistoricalSample, ProjectionError,
    ProjectionParams, ProjectionSummary, SCENARIO_TABLE, SHARED_MONTHLY_INFLATION, Scenario,
    YieldParams, YieldSummary, calculate_projection, calculate_yield_projection, run_backtest,
};

pub mod cli;

// Rates are percent on the wire (`inflationRate: 4.5`).
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    initial_amount: Option<f64>,
    monthly_contribution: Option<f64>,
    years: Option<u32>,
    inflation_rate: Option<f64>,
    savings_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BacktestPayload {
    initial_amount: Option<f64>,
    years: Option<u32>,
    savings_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct YieldPayload {
    initial_amount: Option<f64>,
    monthly_contribution: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    initial_amount: f64,
    monthly_contribution: f64,
    years: u32,
    annual_inflation_rate: f64,
    monthly_savings_rate: f64,
    #[serde(flatten)]
    summary: ProjectionSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BacktestResponse {
    initial_amount: f64,
    years: u32,
    monthly_savings_rate: f64,
    #[serde(flatten)]
    summary: BacktestSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioRateResponse {
    scenario: Scenario,
    label: &'static str,
    monthly_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct YieldResponse {
    initial_amount: f64,
    monthly_contribution: f64,
    years: u32,
    monthly_inflation: f64,
    rates: Vec<ScenarioRateResponse>,
    #[serde(flatten)]
    summary: YieldSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnualRateResponse {
    year: i32,
    rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse<'a> {
    first: Option<&'a str>,
    last: Option<&'a str>,
    samples: &'a [HistoricalSample],
    annual: Vec<AnnualRateResponse>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn projection_params_from_payload(payload: ProjectionPayload) -> ProjectionParams {
    let mut params = ProjectionParams::default();
    if let Some(v) = payload.initial_amount {
        params.initial_amount = v;
    }
    if let Some(v) = payload.monthly_contribution {
        params.monthly_contribution = v;
    }
    if let Some(v) = payload.years {
        params.years = v;
    }
    if let Some(v) = payload.inflation_rate {
        params.annual_inflation_rate = v / 100.0;
    }
    if let Some(v) = payload.savings_rate {
        params.monthly_savings_rate = v / 100.0;
    }
    params
}

fn backtest_params_from_payload(payload: BacktestPayload) -> BacktestParams {
    let mut params = BacktestParams::default();
    if let Some(v) = payload.initial_amount {
        params.initial_amount = v;
    }
    if let Some(v) = payload.years {
        params.years = v;
    }
    if let Some(v) = payload.savings_rate {
        params.monthly_savings_rate = v / 100.0;
    }
    params
}

fn yield_params_from_payload(payload: YieldPayload) -> YieldParams {
    let mut params = YieldParams::default();
    if let Some(v) = payload.initial_amount {
        params.initial_amount = v;
    }
    if let Some(v) = payload.monthly_contribution {
        params.monthly_contribution = v;
    }
    if let Some(v) = payload.years {
        params.years = v;
    }
    params
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route(
            "/api/backtest",
            get(backtest_get_handler).post(backtest_post_handler),
        )
        .route("/api/yield", get(yield_get_handler).post(yield_post_handler))
        .route("/api/history", get(history_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("projection API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/projection");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_get_handler(payload: Result<Query<ProjectionPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => projection_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn projection_post_handler(payload: Result<Json<ProjectionPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => projection_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

fn projection_handler_impl(payload: ProjectionPayload) -> Response {
    let params = projection_params_from_payload(payload);
    match calculate_projection(&params) {
        Ok(summary) => json_response(
            StatusCode::OK,
            ProjectionResponse {
                initial_amount: params.initial_amount,
                monthly_contribution: params.monthly_contribution,
                years: params.years,
                annual_inflation_rate: params.annual_inflation_rate,
                monthly_savings_rate: params.monthly_savings_rate,
                summary,
            },
        ),
        Err(e) => projection_error_response(e),
    }
}

async fn backtest_get_handler(payload: Result<Query<BacktestPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => backtest_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn backtest_post_handler(payload: Result<Json<BacktestPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => backtest_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

fn backtest_handler_impl(payload: BacktestPayload) -> Response {
    let params = backtest_params_from_payload(payload);
    let result = HistoricalIndex::embedded().and_then(|index| run_backtest(&params, index));
    match result {
        Ok(summary) => json_response(
            StatusCode::OK,
            BacktestResponse {
                initial_amount: params.initial_amount,
                years: params.years,
                monthly_savings_rate: params.monthly_savings_rate,
                summary,
            },
        ),
        Err(e) => projection_error_response(e),
    }
}

async fn yield_get_handler(payload: Result<Query<YieldPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => yield_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn yield_post_handler(payload: Result<Json<YieldPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => yield_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

fn yield_handler_impl(payload: YieldPayload) -> Response {
    let params = yield_params_from_payload(payload);
    match calculate_yield_projection(&params) {
        Ok(summary) => json_response(
            StatusCode::OK,
            YieldResponse {
                initial_amount: params.initial_amount,
                monthly_contribution: params.monthly_contribution,
                years: params.years,
                monthly_inflation: SHARED_MONTHLY_INFLATION,
                rates: SCENARIO_TABLE
                    .iter()
                    .map(|entry| ScenarioRateResponse {
                        scenario: entry.scenario,
                        label: entry.scenario.label(),
                        monthly_rate: entry.monthly_rate,
                    })
                    .collect(),
                summary,
            },
        ),
        Err(e) => projection_error_response(e),
    }
}

async fn history_handler() -> Response {
    let index = match HistoricalIndex::embedded() {
        Ok(index) => index,
        Err(e) => return projection_error_response(e),
    };
    json_response(
        StatusCode::OK,
        HistoryResponse {
            first: index.first().map(|s| s.date.as_str()),
            last: index.last().map(|s| s.date.as_str()),
            samples: index.samples(),
            annual: index
                .annual_rates()
                .into_iter()
                .map(|(year, rate)| AnnualRateResponse { year, rate })
                .collect(),
        },
    )
}

fn projection_error_response(err: ProjectionError) -> Response {
    match err {
        ProjectionError::InvalidInput { .. } => {
            warn!("rejected request: {err}");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        ProjectionError::History(_) => {
            warn!("historical data unavailable: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn rejected_payload_response(detail: &str) -> Response {
    warn!("rejected request payload: {detail}");
    error_response(StatusCode::BAD_REQUEST, detail)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    async fn send(request: Request<Body>) -> (StatusCode, Response, Value) {
        let response = router().oneshot(request).await.expect("router responds");
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("body readable");
        let json: Value = serde_json::from_slice(&bytes).expect("json body");
        (status, Response::from_parts(parts, Body::empty()), json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    #[test]
    fn projection_payload_merges_onto_defaults_and_converts_percent() {
        let payload: ProjectionPayload = serde_json::from_str(
            r#"{"initialAmount": 5000, "inflationRate": 6, "savingsRate": 0.7}"#,
        )
        .expect("json parses");
        let params = projection_params_from_payload(payload);
        assert_approx(params.initial_amount, 5_000.0);
        assert_approx(params.monthly_contribution, 0.0);
        assert_eq!(params.years, 10);
        assert_approx(params.annual_inflation_rate, 0.06);
        assert_approx(params.monthly_savings_rate, 0.007);
    }

    #[test]
    fn empty_payloads_fall_back_to_engine_defaults() {
        assert_eq!(
            projection_params_from_payload(ProjectionPayload::default()),
            ProjectionParams::default()
        );
        assert_eq!(
            backtest_params_from_payload(BacktestPayload::default()),
            BacktestParams::default()
        );
        assert_eq!(
            yield_params_from_payload(YieldPayload::default()),
            YieldParams::default()
        );
    }

    #[tokio::test]
    async fn projection_get_returns_points_and_summary() {
        let (status, response, json) = send(get(
            "/api/projection?initialAmount=10000&monthlyContribution=1000&years=1",
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        assert_eq!(json["finalNominal"], 22_952.0);
        assert_eq!(json["finalReal"], 21_964.0);
        assert_eq!(json["points"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["points"][0]["nominalValue"], 10_000.0);
        assert_eq!(json["erosionWarning"], true);
    }

    #[tokio::test]
    async fn projection_rejects_zero_years() {
        let (status, _, json) = send(post_json("/api/projection", r#"{"years": 0}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            json["error"]
                .as_str()
                .is_some_and(|msg| msg.contains("years"))
        );
    }

    #[tokio::test]
    async fn backtest_reports_window_and_label() {
        let (status, _, json) = send(post_json("/api/backtest", r#"{"years": 10}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["periodLabel"], "2016-01 to 2025-12");
        assert_eq!(json["window"]["mode"], "rolling");
        assert_eq!(json["window"]["startIndex"], 72);
        assert_eq!(json["points"].as_array().map(Vec::len), Some(121));

        let (status, _, json) = send(get("/api/backtest?years=50")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["window"]["mode"], "cyclic");
        assert_eq!(
            json["periodLabel"],
            "cyclic repetition of 2010-01 to 2025-12"
        );
    }

    #[tokio::test]
    async fn yield_comparison_lists_every_scenario() {
        let (status, _, json) = send(get("/api/yield?initialAmount=10000&years=10")).await;
        assert_eq!(status, StatusCode::OK);
        for key in ["idle-cash", "savings", "treasury", "optimized"] {
            assert!(json["final"][key]["real"].is_number(), "missing {key}");
        }
        assert_eq!(json["rates"].as_array().map(Vec::len), Some(4));
        assert!(json["opportunityCost"].as_f64().is_some_and(|v| v > 1.0));
        assert!(json["wealthGap"].as_f64().is_some_and(|v| v > 0.0));
    }

    #[tokio::test]
    async fn yield_rejects_negative_contribution() {
        let (status, _, _) = send(post_json("/api/yield", r#"{"monthlyContribution": -1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    fn assert_json_bad_request(status: StatusCode, response: &Response, json: &Value) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().is_some_and(|msg| !msg.is_empty()));
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
    }

    #[tokio::test]
    async fn malformed_payloads_get_json_bad_request() {
        let (status, response, json) =
            send(post_json("/api/projection", r#"{"years": -1}"#)).await;
        assert_json_bad_request(status, &response, &json);

        let (status, response, json) = send(get("/api/projection?years=-1")).await;
        assert_json_bad_request(status, &response, &json);

        let (status, response, json) =
            send(post_json("/api/yield", r#"{"initialAmount": "abc"}"#)).await;
        assert_json_bad_request(status, &response, &json);

        let (status, response, json) = send(get("/api/backtest?years=ten")).await;
        assert_json_bad_request(status, &response, &json);

        let (status, response, json) = send(post_json("/api/backtest", "{not json")).await;
        assert_json_bad_request(status, &response, &json);
    }

    #[tokio::test]
    async fn history_lists_samples_and_full_years() {
        let (status, _, json) = send(get("/api/history")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["first"], "2010-01");
        assert_eq!(json["last"], "2025-12");
        assert_eq!(json["samples"].as_array().map(Vec::len), Some(192));
        assert_eq!(json["annual"].as_array().map(Vec::len), Some(16));
    }

    #[tokio::test]
    async fn unknown_routes_return_json_404() {
        let (status, _, json) = send(get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not found");

        let (status, _, json) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }
}
