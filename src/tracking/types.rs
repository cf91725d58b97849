use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::TrackingError;

/// WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleProfile {
    CarDelivery,
    Truck,
    SmallTruckDelivery,
    Bike,
}

impl VehicleProfile {
    pub const ALL: [VehicleProfile; 4] = [
        VehicleProfile::CarDelivery,
        VehicleProfile::Truck,
        VehicleProfile::SmallTruckDelivery,
        VehicleProfile::Bike,
    ];

    /// Case-sensitive lookup against the wire names.
    pub fn parse(name: &str) -> Result<Self, TrackingError> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_ref() == name)
            .ok_or_else(|| TrackingError::InvalidVehicleType(name.to_string()))
    }

    /// Profile name understood by the routing provider.
    pub fn routing_profile(&self) -> &'static str {
        match self {
            VehicleProfile::CarDelivery => "car_delivery",
            VehicleProfile::Truck => "truck",
            VehicleProfile::SmallTruckDelivery => "small_truck_delivery",
            VehicleProfile::Bike => "bike",
        }
    }
}

pub const DEFAULT_WIND_SPEED_MPS: f64 = 0.0;
pub const DEFAULT_VISIBILITY_M: f64 = 10_000.0;
pub const DEFAULT_AQI: f64 = 0.0;
pub const DEFAULT_TRAFFIC_SPEED: f64 = 50.0;

/// Environmental and traffic readings for one position. Fields a provider
/// leaves out keep their neutral default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TelemetrySnapshot {
    pub wind_speed_mps: f64,
    pub visibility_m: f64,
    pub air_quality_index: f64,
    pub current_traffic_speed: f64,
    pub free_flow_traffic_speed: f64,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            wind_speed_mps: DEFAULT_WIND_SPEED_MPS,
            visibility_m: DEFAULT_VISIBILITY_M,
            air_quality_index: DEFAULT_AQI,
            current_traffic_speed: DEFAULT_TRAFFIC_SPEED,
            free_flow_traffic_speed: DEFAULT_TRAFFIC_SPEED,
        }
    }
}

/// Snapshot published at the end of every successful tick.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackingState {
    pub sequence: u64,
    pub location: Coordinate,
    pub telemetry: TelemetrySnapshot,
    /// Grams of CO2 for the tick's distance increment.
    pub emissions_g: f64,
    pub eta_minutes: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Stopped,
    Failed { reason: String },
}

/// Everything needed to spawn a tick loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub start: Coordinate,
    pub end: Coordinate,
    pub vehicle: VehicleProfile,
    pub load_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionInfo {
    pub id: Uuid,
    pub start: Coordinate,
    pub end: Coordinate,
    pub vehicle: VehicleProfile,
    pub load_factor: f64,
    pub total_distance_m: f64,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
}

/// What a reader sees: the current session (if any) and its last snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveView {
    pub session: Option<SessionInfo>,
    pub state: Option<TrackingState>,
}

impl LiveView {
    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map(|s| s.status.clone())
            .unwrap_or(SessionStatus::Idle)
    }
}

/// Cargo load multiplier. Anything that is not a finite number of at least
/// one counts as an empty load.
pub fn normalize_load_factor(load_factor: Option<f64>) -> f64 {
    match load_factor {
        Some(f) if f.is_finite() && f >= 1.0 => f,
        _ => 1.0,
    }
}
