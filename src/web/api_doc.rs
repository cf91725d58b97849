use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::tracking::{
    LiveUpdateResponse, StartTrackingRequest, StartTrackingResponse, StopResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::tracking::start,
        super::api::tracking::live,
        super::api::tracking::stop,
        super::api::tracking::status,
    ),
    components(
        schemas(
            StartTrackingRequest,
            StartTrackingResponse,
            LiveUpdateResponse,
            StopResponse,
            ErrorResponse,
            crate::tracking::Coordinate,
            crate::tracking::VehicleProfile,
            crate::tracking::TelemetrySnapshot,
            crate::tracking::TrackingState,
            crate::tracking::SessionStatus,
            crate::tracking::SessionInfo,
        )
    ),
    info(
        title = "Ecotrack Tracking API",
        description = "Simulated route tracking with live emissions and arrival estimates",
        version = "0.1.0"
    ),
    tags(
        (name = "tracking", description = "Tracking session lifecycle and live updates")
    )
)]
pub struct ApiDoc;
