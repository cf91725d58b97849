use super::types::Coordinate;

/// Share of the remaining latitude/longitude delta covered per tick.
pub const ADVANCE_FRACTION: f64 = 0.1;

const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Moves `current` a fixed fraction of the way toward `destination`,
/// interpolating each axis independently. Never lands exactly on the
/// destination unless already there.
pub fn advance(current: Coordinate, destination: Coordinate) -> Coordinate {
    Coordinate {
        lat: current.lat + (destination.lat - current.lat) * ADVANCE_FRACTION,
        lon: current.lon + (destination.lon - current.lon) * ADVANCE_FRACTION,
    }
}

/// Great-circle distance in metres (haversine).
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}
