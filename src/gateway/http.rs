use std::time::Duration;

use serde_json::Value;

use super::parsing::{parse_air_quality, parse_geocode, parse_route, parse_traffic, parse_weather};
use super::{BoxFuture, Geocoder, ProviderError, RouteGeometry, RouteProvider, TelemetryGateway};
use crate::tracking::{Coordinate, TelemetrySnapshot, VehicleProfile};

/// Shared HTTP client; every request it sends is bounded by `timeout`.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, ProviderError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

async fn get_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| ProviderError::decode(provider, e.to_string()))
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    retries: u32,
    backoff: Duration,
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, base_url: String, retries: u32, backoff: Duration) -> Self {
        Self {
            client,
            base_url,
            retries: retries.max(1),
            backoff,
        }
    }

    async fn search(&self, address: &str) -> Result<Option<Coordinate>, ProviderError> {
        let request = self
            .client
            .get(format!("{}/search", self.base_url.trim_end_matches('/')))
            .query(&[("q", address), ("format", "json"), ("limit", "1")]);
        let body = get_json("nominatim", request).await?;
        Ok(parse_geocode(&body))
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, ProviderError>> {
        Box::pin(async move {
            let mut attempt = 1;
            loop {
                match self.search(address).await {
                    Ok(Some(coordinate)) => return Ok(coordinate),
                    Ok(None) => return Err(ProviderError::NotFound(address.to_string())),
                    Err(e) if e.is_transient() && attempt < self.retries => {
                        log::warn!(
                            "Geocoder timed out for '{}', retrying ({}/{})",
                            address,
                            attempt,
                            self.retries
                        );
                        tokio::time::sleep(self.backoff).await;
                        attempt += 1;
                    }
                    Err(e) => {
                        log::error!("Failed to geocode address '{}': {}", address, e);
                        return Err(e);
                    }
                }
            }
        })
    }
}

pub struct GraphHopperRouter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GraphHopperRouter {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

impl RouteProvider for GraphHopperRouter {
    fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        vehicle: VehicleProfile,
    ) -> BoxFuture<'_, Result<RouteGeometry, ProviderError>> {
        Box::pin(async move {
            let request = self.client.get(&self.base_url).query(&[
                ("point", format!("{},{}", start.lat, start.lon)),
                ("point", format!("{},{}", end.lat, end.lon)),
                ("vehicle", vehicle.routing_profile().to_string()),
                ("locale", "en".to_string()),
                ("points_encoded", "false".to_string()),
                ("key", self.api_key.clone()),
            ]);
            let body = get_json("graphhopper", request).await.inspect_err(|e| {
                log::error!("Error fetching route data from GraphHopper: {}", e);
            })?;
            parse_route(&body)
        })
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryEndpoints {
    pub weather_url: String,
    pub weather_api_key: String,
    pub air_quality_url: String,
    pub air_quality_token: String,
    pub traffic_url: String,
    pub traffic_api_key: String,
}

/// OpenWeather + WAQI + TomTom flow segment data, fetched concurrently.
pub struct HttpTelemetryGateway {
    client: reqwest::Client,
    endpoints: TelemetryEndpoints,
}

impl HttpTelemetryGateway {
    pub fn new(client: reqwest::Client, endpoints: TelemetryEndpoints) -> Self {
        Self { client, endpoints }
    }

    async fn weather(&self, at: Coordinate) -> Result<(f64, f64), ProviderError> {
        let request = self.client.get(&self.endpoints.weather_url).query(&[
            ("lat", at.lat.to_string()),
            ("lon", at.lon.to_string()),
            ("appid", self.endpoints.weather_api_key.clone()),
            ("units", "metric".to_string()),
        ]);
        let body = get_json("openweather", request).await?;
        Ok(parse_weather(&body))
    }

    async fn air_quality(&self, at: Coordinate) -> Result<f64, ProviderError> {
        let url = format!(
            "{}/geo:{};{}/",
            self.endpoints.air_quality_url.trim_end_matches('/'),
            at.lat,
            at.lon
        );
        let request = self
            .client
            .get(url)
            .query(&[("token", self.endpoints.air_quality_token.as_str())]);
        let body = get_json("waqi", request).await?;
        parse_air_quality(&body)
    }

    async fn traffic(&self, at: Coordinate) -> Result<(f64, f64), ProviderError> {
        let request = self.client.get(&self.endpoints.traffic_url).query(&[
            ("point", format!("{},{}", at.lat, at.lon)),
            ("key", self.endpoints.traffic_api_key.clone()),
        ]);
        let body = get_json("tomtom", request).await?;
        Ok(parse_traffic(&body))
    }
}

impl TelemetryGateway for HttpTelemetryGateway {
    fn fetch_telemetry(
        &self,
        at: Coordinate,
    ) -> BoxFuture<'_, Result<TelemetrySnapshot, ProviderError>> {
        Box::pin(async move {
            let ((wind, visibility), aqi, (current, free_flow)) =
                tokio::try_join!(self.weather(at), self.air_quality(at), self.traffic(at))
                    .inspect_err(|e| log::error!("Error fetching real-time data: {}", e))?;

            Ok(TelemetrySnapshot {
                wind_speed_mps: wind,
                visibility_m: visibility,
                air_quality_index: aqi,
                current_traffic_speed: current,
                free_flow_traffic_speed: free_flow,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    /// `/search` answering with `status` and `body` after `delay`, counting hits.
    async fn search_server(
        status: StatusCode,
        body: Value,
        delay: Duration,
    ) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/search",
            get(move || {
                let counter = counter.clone();
                let body = body.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    (status, Json(body))
                }
            }),
        );
        (serve(app).await, hits)
    }

    fn geocoder(base_url: String, timeout: Duration) -> NominatimGeocoder {
        let client = build_client(timeout, "ecotrack-test").unwrap();
        NominatimGeocoder::new(client, base_url, 3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn geocoder_resolves_first_hit() {
        let (url, hits) = search_server(
            StatusCode::OK,
            json!([{"lat": "52.52", "lon": "13.405"}, {"lat": "0", "lon": "0"}]),
            Duration::ZERO,
        )
        .await;
        let coordinate = geocoder(url, Duration::from_secs(5))
            .resolve("Berlin")
            .await
            .unwrap();
        assert_eq!(coordinate, Coordinate::new(52.52, 13.405));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn geocoder_retries_timeouts_up_to_limit() {
        let (url, hits) =
            search_server(StatusCode::OK, json!([]), Duration::from_millis(1000)).await;
        let result = geocoder(url, Duration::from_millis(50))
            .resolve("Berlin")
            .await;

        assert!(matches!(result, Err(ProviderError::Request(ref e)) if e.is_timeout()));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn geocoder_empty_result_is_not_found_without_retry() {
        let (url, hits) = search_server(StatusCode::OK, json!([]), Duration::ZERO).await;
        let result = geocoder(url, Duration::from_secs(5)).resolve("Atlantis").await;

        assert!(matches!(result, Err(ProviderError::NotFound(ref a)) if a == "Atlantis"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn geocoder_error_status_is_not_retried() {
        let (url, hits) =
            search_server(StatusCode::INTERNAL_SERVER_ERROR, json!({}), Duration::ZERO).await;
        let result = geocoder(url, Duration::from_secs(5)).resolve("Berlin").await;

        assert!(matches!(
            result,
            Err(ProviderError::Status {
                provider: "nominatim",
                status: 500
            })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    async fn telemetry_gateway(traffic_status: StatusCode) -> HttpTelemetryGateway {
        let app = Router::new()
            .route(
                "/weather",
                get(|| async { Json(json!({"wind": {"speed": 4.0}, "visibility": 8000})) }),
            )
            .route(
                "/feed/{*location}",
                get(|| async { Json(json!({"status": "ok", "data": {"aqi": "70"}})) }),
            )
            .route(
                "/traffic",
                get(move || async move {
                    (
                        traffic_status,
                        Json(json!({"flowSegmentData": {"currentSpeed": 30, "freeFlowSpeed": 60}})),
                    )
                }),
            );
        let base = serve(app).await;
        let client = build_client(Duration::from_secs(5), "ecotrack-test").unwrap();
        HttpTelemetryGateway::new(
            client,
            TelemetryEndpoints {
                weather_url: format!("{}/weather", base),
                weather_api_key: "ow".into(),
                air_quality_url: format!("{}/feed", base),
                air_quality_token: "aq".into(),
                traffic_url: format!("{}/traffic", base),
                traffic_api_key: "tt".into(),
            },
        )
    }

    #[tokio::test]
    async fn telemetry_combines_all_feeds() {
        let gateway = telemetry_gateway(StatusCode::OK).await;
        let telemetry = gateway
            .fetch_telemetry(Coordinate::new(52.52, 13.405))
            .await
            .unwrap();

        assert_eq!(
            telemetry,
            TelemetrySnapshot {
                wind_speed_mps: 4.0,
                visibility_m: 8000.0,
                air_quality_index: 70.0,
                current_traffic_speed: 30.0,
                free_flow_traffic_speed: 60.0,
            }
        );
    }

    #[tokio::test]
    async fn telemetry_fails_when_one_feed_fails() {
        let gateway = telemetry_gateway(StatusCode::SERVICE_UNAVAILABLE).await;
        let result = gateway.fetch_telemetry(Coordinate::new(52.52, 13.405)).await;

        assert!(matches!(
            result,
            Err(ProviderError::Status {
                provider: "tomtom",
                status: 503
            })
        ));
    }
}
