//! Collaborators the tracking engine talks to: geocoding, routing and the
//! combined weather/air-quality/traffic feed.
//!
//! Traits return [`BoxFuture`] so implementations can be held as
//! `Arc<dyn ...>` and swapped for scripted fakes in tests.

mod error;
mod http;
mod parsing;

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use utoipa::ToSchema;

use crate::tracking::{Coordinate, TelemetrySnapshot, VehicleProfile};

pub use error::ProviderError;
pub use http::{
    build_client, GraphHopperRouter, HttpTelemetryGateway, NominatimGeocoder, TelemetryEndpoints,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RouteGeometry {
    pub points: Vec<Coordinate>,
    pub distance_m: f64,
}

pub trait Geocoder: Send + Sync {
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, ProviderError>>;
}

pub trait RouteProvider: Send + Sync {
    fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        vehicle: VehicleProfile,
    ) -> BoxFuture<'_, Result<RouteGeometry, ProviderError>>;
}

/// Any failing sub-source fails the whole call.
pub trait TelemetryGateway: Send + Sync {
    fn fetch_telemetry(
        &self,
        at: Coordinate,
    ) -> BoxFuture<'_, Result<TelemetrySnapshot, ProviderError>>;
}
