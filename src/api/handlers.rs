//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::types::{ErrorResponse, HealthResponse, PingResponse};
use crate::audit::AuditIssue;
use crate::error::CalcError;
use crate::request::CalcRequest;
use crate::runner::run_calculation;

/// `GET /health` → 200
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /api/ping` → 200
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        service: "pv-advisor",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/calculate` → 200 + calculation payload.
///
/// Malformed or invalid input is a 400; an infeasible sweep or a failed
/// audit is a 422. Outgoing payloads are checked against the embedded
/// response schema and marked in `meta.schema_validation`.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let request: CalcRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            return error_body(
                StatusCode::BAD_REQUEST,
                format!("malformed request: {e}"),
                None,
            );
        }
    };

    let response = match run_calculation(&request, &state.config) {
        Ok(response) => response,
        Err(err) => return calc_error_body(err),
    };
    tracing::info!(winner = %response.winner.code, "calculation complete");

    let mut value = match serde_json::to_value(&response) {
        Ok(value) => value,
        Err(e) => {
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("response serialization failed: {e}"),
                None,
            );
        }
    };

    let marker = match &state.validator {
        Some(validator) => {
            if let Err(error) = validator.validate(&value) {
                tracing::warn!(%error, "response failed schema validation");
                "failed"
            } else {
                "passed"
            }
        }
        None => "unavailable",
    };
    value["meta"]["schema_validation"] = serde_json::Value::from(marker);

    (StatusCode::OK, Json(value)).into_response()
}

fn calc_error_body(err: CalcError) -> Response {
    let message = err.to_string();
    let (status, issues) = match err {
        CalcError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, None),
        CalcError::Infeasible(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
        CalcError::AuditFailed { issues } => (StatusCode::UNPROCESSABLE_ENTITY, Some(issues)),
    };
    error_body(status, message, issues)
}

fn error_body(status: StatusCode, error: String, issues: Option<Vec<AuditIssue>>) -> Response {
    (status, Json(ErrorResponse { error, issues })).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::EngineConfig;

    fn make_state() -> Arc<AppState> {
        Arc::new(AppState::new(EngineConfig::default()))
    }

    fn fixture_body() -> serde_json::Value {
        json!({
            "production": {
                "monthly_kwh": [500.0, 450.0, 600.0, 650.0, 700.0, 750.0,
                                780.0, 740.0, 600.0, 550.0, 480.0, 420.0]
            },
            "consumption": { "monthly_kwh": vec![580.0; 12] },
            "tariffs": { "effective_price_eur_kwh": 0.1952 }
        })
    }

    fn post_calculate(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/calculate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = router(make_state());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ping_identifies_service() {
        let app = router(make_state());
        let req = Request::builder()
            .uri("/api/ping")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["service"], "pv-advisor");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn calculate_passes_schema_validation() {
        let app = router(make_state());
        let resp = app.oneshot(post_calculate(fixture_body())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["meta"]["schema_validation"], "passed");
        assert_eq!(
            json["scenarios"]["A1"]["months"]
                .as_array()
                .expect("months array")
                .len(),
            12
        );
    }

    #[tokio::test]
    async fn unknown_field_returns_400() {
        let app = router(make_state());
        let resp = app
            .oneshot(post_calculate(json!({ "nope": true })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn short_profile_returns_400() {
        let mut body = fixture_body();
        body["production"] = json!({ "monthly_kwh": [500.0, 450.0] });
        let app = router(make_state());
        let resp = app.oneshot(post_calculate(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let message = json["error"].as_str().expect("error message");
        assert!(message.contains("production"));
    }

    #[tokio::test]
    async fn impossible_budget_returns_422() {
        let mut body = fixture_body();
        body["budget_eur"] = json!(1.0);
        let app = router(make_state());
        let resp = app.oneshot(post_calculate(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
