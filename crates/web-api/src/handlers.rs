use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kite_bridge_router::{HealthReport, OrderRouter, SignalError, SignalOutcome};
use serde::Serialize;
use std::sync::Arc;

/// Error response: `{"code": "...", "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

pub struct ApiError(SignalError);

impl From<SignalError> for ApiError {
    fn from(e: SignalError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Receives one alert. The body is passed through raw so malformed JSON is
/// reported in the bridge's own error format.
///
/// # Errors
/// Returns the router's error mapped to its HTTP status.
pub async fn webhook(
    State(router): State<Arc<OrderRouter>>,
    body: Bytes,
) -> Result<Json<SignalOutcome>, ApiError> {
    let outcome = router.handle_signal(&body).await?;
    Ok(Json(outcome))
}

pub async fn health(State(router): State<Arc<OrderRouter>>) -> Json<HealthReport> {
    Json(router.health())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiServer;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use kite_bridge_core::{AppConfig, Broker};
    use kite_bridge_kite::PaperBroker;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let broker: Arc<dyn Broker> = Arc::new(PaperBroker::new());
        let router = OrderRouter::new(broker, &AppConfig::default()).unwrap();
        ApiServer::new(Arc::new(router)).router()
    }

    async fn post(app: axum::Router, body: &'static str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn exit_without_position_is_ok_noop() {
        let (status, body) =
            post(app(), r#"{"id": 1, "symbol": "NSE:NIFTY", "side": "EXIT"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "noop", "reason": "no open position"}));
    }

    #[tokio::test]
    async fn duplicate_is_ignored() {
        let app = app();
        let payload = r#"{"id": 2, "symbol": "NSE:NIFTY", "side": "EXIT"}"#;
        post(app.clone(), payload).await;
        let (status, body) = post(app, payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ignored", "reason": "duplicate"}));
    }

    #[tokio::test]
    async fn unsupported_symbol_is_bad_request() {
        let (status, body) = post(
            app(),
            r#"{"id": 3, "symbol": "NSE:BANKNIFTY", "side": "LONG", "price": 51000}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "unsupported_symbol");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = post(app(), "id=4&side=LONG").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "malformed_payload");
    }

    #[tokio::test]
    async fn health_reports_empty_cache() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["broker"], "paper");
        assert!(body["cache"].is_null());
        assert_eq!(body["seen_signals"], 0);
    }
}
