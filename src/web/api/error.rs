use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::tracking::TrackingError;

pub enum ApiError {
    Tracking(TrackingError),
    BadRequest(String),
}

impl From<TrackingError> for ApiError {
    fn from(e: TrackingError) -> Self {
        ApiError::Tracking(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Tracking(e) => {
                let (status, code) = match &e {
                    TrackingError::InvalidVehicleType(_) => {
                        (StatusCode::BAD_REQUEST, "invalid_vehicle_type")
                    }
                    TrackingError::GeocodeFailed { .. } => {
                        (StatusCode::BAD_REQUEST, "geocode_failed")
                    }
                    TrackingError::RouteFailed(_) => (StatusCode::BAD_GATEWAY, "route_failed"),
                    TrackingError::TelemetryFailed(_) => {
                        (StatusCode::BAD_GATEWAY, "telemetry_failed")
                    }
                };
                (
                    status,
                    Json(ErrorResponse::with_message(code, &e.to_string())),
                )
                    .into_response()
            }
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("bad_request", &msg)),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
