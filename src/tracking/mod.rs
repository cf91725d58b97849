mod controller;
mod emissions;
mod error;
mod eta;
mod launch;
mod position;
mod publisher;
mod types;

pub use controller::{TrackingController, TrackingSettings};
pub use emissions::{estimate_emissions, EmissionFactors};
pub use error::TrackingError;
pub use eta::{estimate_eta_minutes, DEFAULT_SAFETY_FACTOR};
pub use launch::{Launcher, StartRequest};
pub use publisher::StatePublisher;
pub use types::{
    normalize_load_factor, Coordinate, SessionInfo, SessionStatus, TelemetrySnapshot,
    TrackingState, VehicleProfile, DEFAULT_AQI, DEFAULT_TRAFFIC_SPEED, DEFAULT_VISIBILITY_M,
    DEFAULT_WIND_SPEED_MPS,
};

#[cfg(test)]
pub(crate) use launch::tests as fakes;
