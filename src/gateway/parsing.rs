use serde_json::Value;

use super::{ProviderError, RouteGeometry};
use crate::tracking::{
    Coordinate, DEFAULT_AQI, DEFAULT_TRAFFIC_SPEED, DEFAULT_VISIBILITY_M, DEFAULT_WIND_SPEED_MPS,
};

/// Number that may arrive as a JSON string ("42") or a placeholder ("-").
fn lenient_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Returns `(wind_speed_mps, visibility_m)`.
pub fn parse_weather(body: &Value) -> (f64, f64) {
    let wind = lenient_f64(&body["wind"]["speed"]).unwrap_or(DEFAULT_WIND_SPEED_MPS);
    let visibility = lenient_f64(&body["visibility"]).unwrap_or(DEFAULT_VISIBILITY_M);
    (wind, visibility)
}

pub fn parse_air_quality(body: &Value) -> Result<f64, ProviderError> {
    if body["status"].as_str() == Some("error") {
        let message = body["data"].as_str().unwrap_or("status error");
        return Err(ProviderError::Unavailable(format!("waqi: {}", message)));
    }
    Ok(lenient_f64(&body["data"]["aqi"])
        .unwrap_or(DEFAULT_AQI)
        .max(0.0))
}

/// Returns `(current_speed, free_flow_speed)`.
pub fn parse_traffic(body: &Value) -> (f64, f64) {
    let segment = &body["flowSegmentData"];
    let current = lenient_f64(&segment["currentSpeed"]).unwrap_or(DEFAULT_TRAFFIC_SPEED);
    let free_flow = lenient_f64(&segment["freeFlowSpeed"]).unwrap_or(DEFAULT_TRAFFIC_SPEED);
    (current, free_flow)
}

/// First hit of a Nominatim search, if any.
pub fn parse_geocode(body: &Value) -> Option<Coordinate> {
    let first = body.as_array()?.first()?;
    Some(Coordinate::new(
        lenient_f64(&first["lat"])?,
        lenient_f64(&first["lon"])?,
    ))
}

/// First path of a GraphHopper response with unencoded points.
pub fn parse_route(body: &Value) -> Result<RouteGeometry, ProviderError> {
    let path = body["paths"]
        .as_array()
        .and_then(|paths| paths.first())
        .ok_or_else(|| ProviderError::decode("graphhopper", "no paths in response"))?;

    // GeoJSON order is [lon, lat]
    let points: Vec<Coordinate> = path["points"]["coordinates"]
        .as_array()
        .map(|coords| {
            coords
                .iter()
                .filter_map(|pair| {
                    Some(Coordinate {
                        lon: lenient_f64(pair.get(0)?)?,
                        lat: lenient_f64(pair.get(1)?)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if points.is_empty() {
        return Err(ProviderError::decode("graphhopper", "no valid route found"));
    }

    Ok(RouteGeometry {
        points,
        distance_m: lenient_f64(&path["distance"]).unwrap_or(0.0),
    })
}
