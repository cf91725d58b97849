use thiserror::Error;

use crate::gateway::ProviderError;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("invalid vehicle type: {0}")]
    InvalidVehicleType(String),
    #[error("could not geocode '{address}': {source}")]
    GeocodeFailed {
        address: String,
        source: ProviderError,
    },
    #[error("route unavailable: {0}")]
    RouteFailed(ProviderError),
    #[error("telemetry unavailable: {0}")]
    TelemetryFailed(ProviderError),
}
