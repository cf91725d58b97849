use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::tracking::{Coordinate, SessionInfo, SessionStatus, StartRequest, TrackingState};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

pub const NO_UPDATES: &str = "no updates available";

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartTrackingRequest {
    pub start_address: String,
    pub end_address: String,
    /// One of `car_delivery`, `truck`, `small_truck_delivery`, `bike`.
    pub vehicle_type: String,
    /// Values that are not a number of at least 1 count as 1.
    #[serde(default, deserialize_with = "deserialize_load_factor")]
    #[schema(value_type = Option<f64>)]
    pub load_factor: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartTrackingResponse {
    pub session_accepted: bool,
    pub session: SessionInfo,
    pub start_coordinate: Coordinate,
    pub end_coordinate: Coordinate,
    pub route: Vec<Coordinate>,
    pub route_distance_m: f64,
    pub initial_emissions_g: f64,
    pub initial_eta_minutes: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LiveUpdateResponse {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TrackingState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StopResponse {
    pub message: String,
    pub status: SessionStatus,
}

#[utoipa::path(
    post,
    path = "/api/tracking/start",
    request_body = StartTrackingRequest,
    responses(
        (status = 200, description = "Tracking started", body = StartTrackingResponse),
        (status = 400, description = "Invalid vehicle type or address", body = ErrorResponse),
        (status = 502, description = "Route or telemetry provider unavailable", body = ErrorResponse)
    ),
    tag = "tracking"
)]
pub async fn start(
    State(state): State<AppState>,
    payload: Result<Json<StartTrackingRequest>, JsonRejection>,
) -> ApiResult<Json<StartTrackingResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state
        .launcher
        .launch(
            &state.controller,
            &StartRequest {
                start_address: request.start_address,
                end_address: request.end_address,
                vehicle_type: request.vehicle_type,
                load_factor: request.load_factor,
            },
        )
        .await
        .inspect_err(|e| log::warn!("Rejected tracking request: {}", e))?;

    Ok(Json(StartTrackingResponse {
        session_accepted: true,
        start_coordinate: outcome.session.start,
        end_coordinate: outcome.session.end,
        session: outcome.session,
        route: outcome.route.points,
        route_distance_m: outcome.route.distance_m,
        initial_emissions_g: outcome.initial_emissions_g,
        initial_eta_minutes: outcome.initial_eta_minutes,
    }))
}

#[utoipa::path(
    get,
    path = "/api/tracking/live",
    responses(
        (status = 200, description = "Latest snapshot, or an error field when none exists yet", body = LiveUpdateResponse)
    ),
    tag = "tracking"
)]
pub async fn live(State(state): State<AppState>) -> Json<LiveUpdateResponse> {
    let view = state.publisher.read();
    let status = view.status();
    let error = view.state.is_none().then(|| NO_UPDATES.to_string());
    Json(LiveUpdateResponse {
        status,
        session: view.session,
        snapshot: view.state,
        error,
    })
}

#[utoipa::path(
    post,
    path = "/api/tracking/stop",
    responses(
        (status = 200, description = "Tracking stopped (or was not running)", body = StopResponse)
    ),
    tag = "tracking"
)]
pub async fn stop(State(state): State<AppState>) -> Json<StopResponse> {
    let mut controller = state.controller.lock().await;
    controller.stop().await;
    Json(StopResponse {
        message: "Real-time tracking stopped.".to_string(),
        status: controller.status(),
    })
}

#[utoipa::path(
    get,
    path = "/api/tracking/status",
    responses(
        (status = 200, description = "Current session status", body = SessionStatus)
    ),
    tag = "tracking"
)]
pub async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.publisher.status())
}

fn deserialize_load_factor<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
