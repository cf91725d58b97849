use super::types::TelemetrySnapshot;

pub const DEFAULT_SAFETY_FACTOR: f64 = 1.1;
pub const MIN_ETA_MINUTES: f64 = 5.0;

/// Minutes to cover `remaining_m` at the observed traffic speed, padded by
/// `safety_factor` and never below [`MIN_ETA_MINUTES`].
pub fn estimate_eta_minutes(
    remaining_m: f64,
    telemetry: &TelemetrySnapshot,
    safety_factor: f64,
) -> f64 {
    let distance_km = remaining_m / 1000.0;

    let free_flow = if telemetry.free_flow_traffic_speed == 0.0 {
        1.0
    } else {
        telemetry.free_flow_traffic_speed
    };
    let baseline = (distance_km / free_flow) * 60.0;

    let ratio = if free_flow > 0.0 {
        telemetry.current_traffic_speed / free_flow
    } else {
        1.0
    };
    let slowdown = if ratio > 0.0 { 1.0 / ratio } else { 1.0 };

    let adjusted = baseline * slowdown * safety_factor;
    // f64::max also maps NaN to the floor
    adjusted.max(MIN_ETA_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traffic(current: f64, free_flow: f64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            current_traffic_speed: current,
            free_flow_traffic_speed: free_flow,
            ..TelemetrySnapshot::default()
        }
    }

    #[test]
    fn free_flowing_traffic_applies_only_safety_factor() {
        // 50 km at 50 km/h is 60 minutes
        let eta = estimate_eta_minutes(50_000.0, &traffic(50.0, 50.0), DEFAULT_SAFETY_FACTOR);
        assert!((eta - 66.0).abs() < 1e-9);
    }

    #[test]
    fn congestion_stretches_eta() {
        let eta = estimate_eta_minutes(50_000.0, &traffic(25.0, 50.0), 1.0);
        assert!((eta - 120.0).abs() < 1e-9);
    }

    #[test]
    fn zero_free_flow_does_not_divide_by_zero() {
        let eta = estimate_eta_minutes(10.0, &traffic(0.0, 0.0), DEFAULT_SAFETY_FACTOR);
        assert_eq!(eta, MIN_ETA_MINUTES);

        // falls back to 1 km/h
        let eta = estimate_eta_minutes(10_000.0, &traffic(1.0, 0.0), 1.0);
        assert!((eta - 600.0).abs() < 1e-9);
    }

    #[test]
    fn stalled_traffic_uses_baseline() {
        let eta = estimate_eta_minutes(50_000.0, &traffic(0.0, 50.0), 1.0);
        assert!((eta - 60.0).abs() < 1e-9);
    }

    #[test]
    fn short_trips_floor_at_five_minutes() {
        assert_eq!(
            estimate_eta_minutes(0.0, &TelemetrySnapshot::default(), DEFAULT_SAFETY_FACTOR),
            MIN_ETA_MINUTES
        );
        assert_eq!(
            estimate_eta_minutes(1_000.0, &TelemetrySnapshot::default(), DEFAULT_SAFETY_FACTOR),
            MIN_ETA_MINUTES
        );
    }
}
