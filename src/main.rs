mod gateway;
mod tracking;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::tracking::{
    estimate_emissions, estimate_eta_minutes, normalize_load_factor, TelemetrySnapshot,
    VehicleProfile,
};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "ecotrack")]
#[command(about = "Live route emissions and arrival tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracking HTTP service
    Serve {
        /// YAML configuration file; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Validate a configuration file
    CheckConfig { config: String },
    /// Compute emissions and ETA for fixed conditions without any network calls
    Estimate {
        #[arg(long)]
        vehicle: String,
        /// Distance the emissions figure covers
        #[arg(long, default_value_t = 1000.0)]
        distance_m: f64,
        /// Distance left to the destination
        #[arg(long, default_value_t = 10_000.0)]
        remaining_m: f64,
        #[arg(long)]
        load_factor: Option<f64>,
        #[arg(long, default_value_t = 0.0)]
        wind: f64,
        #[arg(long, default_value_t = 10_000.0)]
        visibility: f64,
        #[arg(long, default_value_t = 0.0)]
        aqi: f64,
        #[arg(long, default_value_t = 50.0)]
        current_speed: f64,
        #[arg(long, default_value_t = 50.0)]
        free_flow_speed: f64,
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config.as_deref()),
        Commands::CheckConfig { config } => check_config(&config),
        Commands::Estimate {
            vehicle,
            distance_m,
            remaining_m,
            load_factor,
            wind,
            visibility,
            aqi,
            current_speed,
            free_flow_speed,
            config,
        } => {
            let telemetry = TelemetrySnapshot {
                wind_speed_mps: wind,
                visibility_m: visibility,
                air_quality_index: aqi,
                current_traffic_speed: current_speed,
                free_flow_traffic_speed: free_flow_speed,
            };
            estimate(
                &vehicle,
                distance_m,
                remaining_m,
                load_factor,
                &telemetry,
                config.as_deref(),
            )
        }
    }
}

fn load_config(path: Option<&str>) -> Option<Config> {
    match path {
        None => Some(Config::default()),
        Some(path) => match Config::from_file(path) {
            Ok(c) => Some(c),
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                None
            }
        },
    }
}

fn serve(path: Option<&str>) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check_config(path: &str) -> ExitCode {
    let Some(config) = load_config(Some(path)) else {
        return ExitCode::FAILURE;
    };

    println!("Config is valid");
    println!("  bind: {}", config.web.bind);
    println!(
        "  tick: every {} for {} m",
        humantime::format_duration(config.tracking.tick_interval),
        config.tracking.tick_distance_m
    );
    for profile in VehicleProfile::ALL {
        println!(
            "  {}: {} g/km",
            profile,
            config.tracking.emission_factors.base_factor(profile)
        );
    }
    let missing = config.providers.missing_keys();
    if !missing.is_empty() {
        println!("  missing provider keys: {}", missing.join(", "));
    }
    ExitCode::SUCCESS
}

fn estimate(
    vehicle: &str,
    distance_m: f64,
    remaining_m: f64,
    load_factor: Option<f64>,
    telemetry: &TelemetrySnapshot,
    config: Option<&str>,
) -> ExitCode {
    let profile = match VehicleProfile::parse(vehicle) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let Some(config) = load_config(config) else {
        return ExitCode::FAILURE;
    };
    let settings = config.tracking.settings();

    let grams = estimate_emissions(
        &settings.emission_factors,
        distance_m,
        profile,
        telemetry,
        normalize_load_factor(load_factor),
    );
    let eta = estimate_eta_minutes(remaining_m, telemetry, settings.safety_factor);

    println!("Emissions: {:.2} g CO2 over {} m", grams, distance_m);
    println!("ETA: {:.1} min for {} m remaining", eta, remaining_m);
    ExitCode::SUCCESS
}
