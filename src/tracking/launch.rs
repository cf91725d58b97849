use std::sync::Arc;
use tokio::sync::Mutex;

use super::controller::{TrackingController, TrackingSettings};
use super::emissions::estimate_emissions;
use super::error::TrackingError;
use super::eta::estimate_eta_minutes;
use super::position::distance_m;
use super::types::{normalize_load_factor, Coordinate, SessionInfo, SessionParams, VehicleProfile};
use crate::gateway::{Geocoder, RouteGeometry, RouteProvider, TelemetryGateway};

#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    pub start_address: String,
    pub end_address: String,
    pub vehicle_type: String,
    pub load_factor: Option<f64>,
}

/// Everything resolved ahead of spawning the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchPlan {
    pub params: SessionParams,
    pub route: RouteGeometry,
    pub initial_emissions_g: f64,
    pub initial_eta_minutes: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartOutcome {
    pub session: SessionInfo,
    pub route: RouteGeometry,
    pub initial_emissions_g: f64,
    pub initial_eta_minutes: f64,
}

/// Resolves a start request against the external collaborators and hands
/// the result to the controller.
pub struct Launcher {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn RouteProvider>,
    gateway: Arc<dyn TelemetryGateway>,
    settings: TrackingSettings,
}

impl Launcher {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn RouteProvider>,
        gateway: Arc<dyn TelemetryGateway>,
        settings: TrackingSettings,
    ) -> Self {
        Self {
            geocoder,
            router,
            gateway,
            settings,
        }
    }

    /// Validation happens before any network call; nothing here touches the
    /// running session.
    pub async fn plan(&self, request: &StartRequest) -> Result<LaunchPlan, TrackingError> {
        let vehicle = VehicleProfile::parse(&request.vehicle_type)?;
        let load_factor = normalize_load_factor(request.load_factor);

        let start = self.geocode(&request.start_address).await?;
        let end = self.geocode(&request.end_address).await?;

        let route = self
            .router
            .fetch_route(start, end, vehicle)
            .await
            .map_err(TrackingError::RouteFailed)?;

        let telemetry = self
            .gateway
            .fetch_telemetry(start)
            .await
            .map_err(TrackingError::TelemetryFailed)?;

        let initial_emissions_g = estimate_emissions(
            &self.settings.emission_factors,
            self.settings.tick_distance_m,
            vehicle,
            &telemetry,
            load_factor,
        );
        let initial_eta_minutes =
            estimate_eta_minutes(distance_m(start, end), &telemetry, self.settings.safety_factor);

        Ok(LaunchPlan {
            params: SessionParams {
                start,
                end,
                vehicle,
                load_factor,
            },
            route,
            initial_emissions_g,
            initial_eta_minutes,
        })
    }

    pub async fn launch(
        &self,
        controller: &Mutex<TrackingController>,
        request: &StartRequest,
    ) -> Result<StartOutcome, TrackingError> {
        let plan = self.plan(request).await?;
        let session = controller.lock().await.start(plan.params).await;
        Ok(StartOutcome {
            session,
            route: plan.route,
            initial_emissions_g: plan.initial_emissions_g,
            initial_eta_minutes: plan.initial_eta_minutes,
        })
    }

    async fn geocode(&self, address: &str) -> Result<Coordinate, TrackingError> {
        self.geocoder
            .resolve(address)
            .await
            .map_err(|source| TrackingError::GeocodeFailed {
                address: address.to_string(),
                source,
            })
    }
}
