use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::gateway::{
    build_client, GraphHopperRouter, HttpTelemetryGateway, NominatimGeocoder, ProviderError,
};
use crate::tracking::{Launcher, TrackingController};

use super::api::tracking as tracking_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;

/// Wires the HTTP collaborators described by `config` into an [`AppState`].
pub fn build_state(config: &Config) -> Result<AppState, ProviderError> {
    let providers = &config.providers;
    let client = build_client(providers.request_timeout, &providers.user_agent)?;

    let gateway = Arc::new(HttpTelemetryGateway::new(
        client.clone(),
        providers.telemetry_endpoints(),
    ));
    let geocoder = Arc::new(NominatimGeocoder::new(
        client.clone(),
        providers.nominatim_url.clone(),
        providers.geocode_retries,
        providers.geocode_backoff,
    ));
    let router = Arc::new(GraphHopperRouter::new(
        client,
        providers.graphhopper_url.clone(),
        providers.graphhopper_api_key.clone(),
    ));

    let settings = config.tracking.settings();
    let launcher = Launcher::new(geocoder, router, gateway.clone(), settings.clone());
    let controller = TrackingController::new(gateway, settings);

    Ok(AppState::new(controller, launcher))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tracking/start", post(tracking_handlers::start))
        .route("/api/tracking/stop", post(tracking_handlers::stop))
        .route("/api/tracking/live", get(tracking_handlers::live))
        .route("/api/tracking/status", get(tracking_handlers::status))
        // Original endpoint names
        .route("/startTracking", post(tracking_handlers::start))
        .route("/live-updates", get(tracking_handlers::live))
        .route("/stop", post(tracking_handlers::stop))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let missing = config.providers.missing_keys();
    if !missing.is_empty() {
        log::warn!("Provider keys not configured: {}", missing.join(", "));
    }

    let state = build_state(&config).map_err(std::io::Error::other)?;

    log::info!(
        "Tracking ticks every {} for {} m per tick",
        humantime::format_duration(config.tracking.tick_interval),
        config.tracking.tick_distance_m
    );
    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let app = router(state.clone());
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    state.controller.lock().await.stop().await;
    log::info!("Server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
