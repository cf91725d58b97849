use serde::{Deserialize, Serialize};

use super::types::{normalize_load_factor, TelemetrySnapshot, VehicleProfile, DEFAULT_VISIBILITY_M};

const WIND_PENALTY_PER_MPS: f64 = 0.03;
const AQI_THRESHOLD: f64 = 50.0;
const AQI_PENALTY_SCALE: f64 = 100.0;
const LOAD_PENALTY_PER_UNIT: f64 = 0.1;

/// Base emission factors in grams of CO2 per kilometre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionFactors {
    pub car_delivery: f64,
    pub truck: f64,
    pub small_truck_delivery: f64,
    pub bike: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            car_delivery: 150.0,
            truck: 400.0,
            small_truck_delivery: 300.0,
            bike: 80.0,
        }
    }
}

impl EmissionFactors {
    pub fn base_factor(&self, profile: VehicleProfile) -> f64 {
        match profile {
            VehicleProfile::CarDelivery => self.car_delivery,
            VehicleProfile::Truck => self.truck,
            VehicleProfile::SmallTruckDelivery => self.small_truck_delivery,
            VehicleProfile::Bike => self.bike,
        }
    }
}

/// Wind raises emissions linearly; visibility below the reference raises
/// them, visibility above it lowers them.
pub fn weather_adjustment(telemetry: &TelemetrySnapshot) -> f64 {
    1.0 + telemetry.wind_speed_mps * WIND_PENALTY_PER_MPS
        + (1.0 - telemetry.visibility_m / DEFAULT_VISIBILITY_M)
}

pub fn air_quality_adjustment(telemetry: &TelemetrySnapshot) -> f64 {
    1.0 + (telemetry.air_quality_index - AQI_THRESHOLD).max(0.0) / AQI_PENALTY_SCALE
}

pub fn traffic_adjustment(telemetry: &TelemetrySnapshot) -> f64 {
    if telemetry.free_flow_traffic_speed == 0.0 {
        return 1.0;
    }
    1.0 + (1.0 - telemetry.current_traffic_speed / telemetry.free_flow_traffic_speed)
}

pub fn load_adjustment(load_factor: f64) -> f64 {
    1.0 + LOAD_PENALTY_PER_UNIT * (normalize_load_factor(Some(load_factor)) - 1.0)
}

/// Grams of CO2 emitted over `distance_m` under the given conditions.
pub fn estimate_emissions(
    factors: &EmissionFactors,
    distance_m: f64,
    profile: VehicleProfile,
    telemetry: &TelemetrySnapshot,
    load_factor: f64,
) -> f64 {
    let grams = (distance_m / 1000.0)
        * factors.base_factor(profile)
        * weather_adjustment(telemetry)
        * air_quality_adjustment(telemetry)
        * load_adjustment(load_factor)
        * traffic_adjustment(telemetry);
    // Out-of-range telemetry can drive an adjustment negative.
    if grams.is_nan() {
        0.0
    } else {
        grams.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calm() -> TelemetrySnapshot {
        TelemetrySnapshot {
            wind_speed_mps: 5.0,
            visibility_m: 10_000.0,
            air_quality_index: 30.0,
            current_traffic_speed: 50.0,
            free_flow_traffic_speed: 50.0,
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn car_delivery_one_kilometre_with_wind() {
        let t = calm();
        assert_close(weather_adjustment(&t), 1.15);
        assert_close(air_quality_adjustment(&t), 1.0);
        assert_close(traffic_adjustment(&t), 1.0);
        assert_close(load_adjustment(1.0), 1.0);

        let grams = estimate_emissions(
            &EmissionFactors::default(),
            1000.0,
            VehicleProfile::CarDelivery,
            &t,
            1.0,
        );
        assert_close(grams, 172.5);
    }

    #[test]
    fn only_aqi_above_fifty_penalizes() {
        let mut t = TelemetrySnapshot::default();
        t.air_quality_index = 50.0;
        assert_close(air_quality_adjustment(&t), 1.0);
        t.air_quality_index = 150.0;
        assert_close(air_quality_adjustment(&t), 2.0);
    }

    #[test]
    fn visibility_above_reference_reduces_emissions() {
        let mut t = TelemetrySnapshot::default();
        t.visibility_m = 15_000.0;
        assert_close(weather_adjustment(&t), 0.5);
        t.visibility_m = 5_000.0;
        assert_close(weather_adjustment(&t), 1.5);
    }

    #[test]
    fn congestion_and_zero_free_flow() {
        let mut t = TelemetrySnapshot::default();
        t.current_traffic_speed = 25.0;
        assert_close(traffic_adjustment(&t), 1.5);
        t.free_flow_traffic_speed = 0.0;
        assert_close(traffic_adjustment(&t), 1.0);
    }

    #[test]
    fn heavy_load_scales_emissions() {
        assert_close(load_adjustment(3.0), 1.2);
        let base = estimate_emissions(
            &EmissionFactors::default(),
            1000.0,
            VehicleProfile::Truck,
            &TelemetrySnapshot::default(),
            3.0,
        );
        assert_close(base, 480.0);
    }

    #[test]
    fn injected_factor_table_is_used() {
        let factors = EmissionFactors {
            bike: 100.0,
            ..EmissionFactors::default()
        };
        let grams = estimate_emissions(
            &factors,
            2000.0,
            VehicleProfile::Bike,
            &TelemetrySnapshot::default(),
            1.0,
        );
        assert_close(grams, 200.0);
    }

    #[test]
    fn absurd_telemetry_never_goes_negative() {
        let mut t = TelemetrySnapshot::default();
        t.visibility_m = 40_000.0;
        let grams = estimate_emissions(
            &EmissionFactors::default(),
            1000.0,
            VehicleProfile::Truck,
            &t,
            1.0,
        );
        assert_eq!(grams, 0.0);
    }

    fn telemetry_strategy() -> impl Strategy<Value = TelemetrySnapshot> {
        (
            0.0..40.0f64,
            0.0..=10_000.0f64,
            0.0..500.0f64,
            0.0..120.0f64,
            0.0..120.0f64,
        )
            .prop_map(|(wind, vis, aqi, free, ratio)| TelemetrySnapshot {
                wind_speed_mps: wind,
                visibility_m: vis,
                air_quality_index: aqi,
                free_flow_traffic_speed: free,
                // current speed never exceeds free flow in realistic readings
                current_traffic_speed: free * (ratio / 120.0),
            })
    }

    fn profile_strategy() -> impl Strategy<Value = VehicleProfile> {
        prop::sample::select(VehicleProfile::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn emissions_are_non_negative_and_linear_in_distance(
            distance in 0.0..100_000.0f64,
            profile in profile_strategy(),
            telemetry in telemetry_strategy(),
            load in 1.0..10.0f64,
        ) {
            let factors = EmissionFactors::default();
            let once = estimate_emissions(&factors, distance, profile, &telemetry, load);
            let twice = estimate_emissions(&factors, distance * 2.0, profile, &telemetry, load);
            prop_assert!(once >= 0.0);
            prop_assert!((twice - 2.0 * once).abs() <= 1e-6 * twice.abs().max(1.0));
        }

        #[test]
        fn load_below_one_matches_unit_load(
            load in -10.0..1.0f64,
            profile in profile_strategy(),
            telemetry in telemetry_strategy(),
        ) {
            let factors = EmissionFactors::default();
            let clamped = estimate_emissions(&factors, 1000.0, profile, &telemetry, load);
            let unit = estimate_emissions(&factors, 1000.0, profile, &telemetry, 1.0);
            prop_assert_eq!(clamped, unit);
        }
    }
}
