//! HTTP handlers for the scan service.
//!
//! - `POST /scan`: classify one snippet, `{"code": "..."}` → `{"label", "confidence"}`.
//! - `GET /health`: liveness plus the active encoder and scaler.
//! - `GET /`: service information.
//!
//! Errors use the body `{"error": {"message": "...", "type": "..."}}`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use vulnscan_core::{PredictionResult, VulnScanError};
use vulnscan_detector::VulnerabilityDetector;

/// Shared state for all handlers.
pub struct AppState {
    /// Loaded detector, read-only for the life of the process.
    pub detector: Arc<VulnerabilityDetector>,
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /scan`.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Source code to classify.
    pub code: String,
}

/// API error response body.
#[derive(Debug, Serialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON error response.
fn api_error(status: StatusCode, error_type: &str, message: &str) -> Response {
    let body = ApiError {
        error: ApiErrorDetail {
            message: message.to_string(),
            error_type: error_type.to_string(),
        },
    };
    (status, Json(body)).into_response()
}

fn detector_error(err: &VulnScanError) -> Response {
    let (status, error_type) = match err {
        VulnScanError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        VulnScanError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
        VulnScanError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_error"),
        VulnScanError::Serialization(_) | VulnScanError::Io(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };
    api_error(status, error_type, &err.to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /scan`
pub async fn scan_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected malformed scan request");
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return api_error(status, "invalid_request", &rejection.body_text());
        }
    };

    let code_chars = request.code.chars().count();
    let detector = Arc::clone(&state.detector);
    let outcome =
        tokio::task::spawn_blocking(move || detector.predict(&request.code)).await;

    match outcome {
        Ok(Ok(result)) => {
            info!(
                code_chars,
                label = %result.label,
                confidence = result.confidence,
                "Scan complete"
            );
            (StatusCode::OK, Json::<PredictionResult>(result)).into_response()
        }
        Ok(Err(err)) if err.is_client_error() => {
            warn!(code_chars, error = %err, "Scan request rejected");
            detector_error(&err)
        }
        Ok(Err(err)) => {
            error!(code_chars, error = %err, "Scan failed");
            detector_error(&err)
        }
        Err(join_err) => {
            error!(code_chars, error = %join_err, "Scan task panicked");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Scan task failed",
            )
        }
    }
}

/// `GET /health`
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    let body = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "encoder": state.detector.encoder_name(),
        "scaler": state.detector.scaler_kind().unwrap_or("none"),
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// `GET /`
pub async fn root_handler() -> Response {
    let body = serde_json::json!({
        "service": "vulnscan",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "scan": "POST /scan",
            "health": "GET /health",
        },
    });
    (StatusCode::OK, Json(body)).into_response()
}
