use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::gateway::TelemetryEndpoints;
use crate::tracking::{EmissionFactors, TrackingSettings, VehicleProfile, DEFAULT_SAFETY_FACTOR};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub tracking: TrackingConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub tick_interval: Duration,
    pub tick_distance_m: f64,
    pub safety_factor: f64,
    pub emission_factors: EmissionFactors,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            tick_distance_m: 1000.0,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            emission_factors: EmissionFactors::default(),
        }
    }
}

impl TrackingConfig {
    pub fn settings(&self) -> TrackingSettings {
        TrackingSettings {
            tick_interval: self.tick_interval,
            tick_distance_m: self.tick_distance_m,
            safety_factor: self.safety_factor,
            emission_factors: self.emission_factors,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
    pub user_agent: String,
    pub geocode_retries: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub geocode_backoff: Duration,
    pub nominatim_url: String,
    pub graphhopper_url: String,
    pub graphhopper_api_key: String,
    pub openweather_url: String,
    pub openweather_api_key: String,
    pub aqicn_url: String,
    pub aqicn_api_key: String,
    pub tomtom_url: String,
    pub tomtom_api_key: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            user_agent: "real_time_route_optimizer".to_string(),
            geocode_retries: 3,
            geocode_backoff: Duration::from_secs(2),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            graphhopper_url: "https://graphhopper.com/api/1/route".to_string(),
            graphhopper_api_key: String::new(),
            openweather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            openweather_api_key: String::new(),
            aqicn_url: "https://api.waqi.info/feed".to_string(),
            aqicn_api_key: String::new(),
            tomtom_url:
                "https://api.tomtom.com/traffic/services/4/flowSegmentData/absolute/10/json"
                    .to_string(),
            tomtom_api_key: String::new(),
        }
    }
}

impl ProvidersConfig {
    pub fn telemetry_endpoints(&self) -> TelemetryEndpoints {
        TelemetryEndpoints {
            weather_url: self.openweather_url.clone(),
            weather_api_key: self.openweather_api_key.clone(),
            air_quality_url: self.aqicn_url.clone(),
            air_quality_token: self.aqicn_api_key.clone(),
            traffic_url: self.tomtom_url.clone(),
            traffic_api_key: self.tomtom_api_key.clone(),
        }
    }

    /// Names of provider keys left empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("graphhopper_api_key", &self.graphhopper_api_key),
            ("openweather_api_key", &self.openweather_api_key),
            ("aqicn_api_key", &self.aqicn_api_key),
            ("tomtom_api_key", &self.tomtom_api_key),
        ]
        .into_iter()
        .filter(|(_, key)| key.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tracking.tick_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "tracking.tick_interval",
                message: "must be greater than zero".into(),
            });
        }
        if !(self.tracking.tick_distance_m.is_finite() && self.tracking.tick_distance_m >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "tracking.tick_distance_m",
                message: "must be a non-negative number".into(),
            });
        }
        if !(self.tracking.safety_factor.is_finite() && self.tracking.safety_factor > 0.0) {
            return Err(ConfigError::Invalid {
                field: "tracking.safety_factor",
                message: "must be a positive number".into(),
            });
        }
        for profile in VehicleProfile::ALL {
            let factor = self.tracking.emission_factors.base_factor(profile);
            if !(factor.is_finite() && factor >= 0.0) {
                return Err(ConfigError::Invalid {
                    field: "tracking.emission_factors",
                    message: format!("{} must be a non-negative number, got {}", profile, factor),
                });
            }
        }
        Ok(())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
