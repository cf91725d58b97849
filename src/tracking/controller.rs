use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::emissions::{estimate_emissions, EmissionFactors};
use super::eta::{estimate_eta_minutes, DEFAULT_SAFETY_FACTOR};
use super::position::{advance, distance_m};
use super::publisher::StatePublisher;
use super::types::{SessionInfo, SessionParams, SessionStatus, TrackingState};
use crate::gateway::TelemetryGateway;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    pub tick_interval: Duration,
    /// Distance each tick's emissions figure is computed for.
    pub tick_distance_m: f64,
    pub safety_factor: f64,
    pub emission_factors: EmissionFactors,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            tick_distance_m: 1000.0,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            emission_factors: EmissionFactors::default(),
        }
    }
}

#[derive(Debug)]
struct WorkerHandle {
    session_id: Uuid,
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the single active tracking session and its background worker.
pub struct TrackingController {
    gateway: Arc<dyn TelemetryGateway>,
    settings: Arc<TrackingSettings>,
    publisher: StatePublisher,
    worker: Option<WorkerHandle>,
}

impl TrackingController {
    pub fn new(gateway: Arc<dyn TelemetryGateway>, settings: TrackingSettings) -> Self {
        Self {
            gateway,
            settings: Arc::new(settings),
            publisher: StatePublisher::new(),
            worker: None,
        }
    }

    /// Cloneable read handle, usable without holding the controller.
    pub fn publisher(&self) -> StatePublisher {
        self.publisher.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.publisher.status()
    }

    /// Waits for the worker to exit. A no-op when nothing is running or the
    /// session already ended on its own.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.stop_tx.send(());
        if let Err(e) = worker.join.await {
            log::error!("Tracking worker for session {} panicked: {}", worker.session_id, e);
            self.publisher.set_status(
                worker.session_id,
                SessionStatus::Failed {
                    reason: "worker panicked".into(),
                },
            );
        }
    }

    /// Replaces any running session with a new one. The previous worker has
    /// fully exited before the new one publishes anything.
    pub async fn start(&mut self, params: SessionParams) -> SessionInfo {
        self.stop().await;

        let session = SessionInfo {
            id: Uuid::new_v4(),
            start: params.start,
            end: params.end,
            vehicle: params.vehicle,
            load_factor: params.load_factor,
            total_distance_m: distance_m(params.start, params.end),
            started_at: Utc::now(),
            status: SessionStatus::Running,
        };
        self.publisher.begin(session.clone());

        log::info!(
            "Starting tracking session {} ({} from {:?} to {:?}, {:.0} m)",
            session.id,
            session.vehicle,
            session.start,
            session.end,
            session.total_distance_m
        );

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_tracking_loop(
            session.id,
            params,
            self.gateway.clone(),
            self.settings.clone(),
            self.publisher.clone(),
            stop_rx,
        ));

        self.worker = Some(WorkerHandle {
            session_id: session.id,
            stop_tx,
            join,
        });

        session
    }
}

async fn run_tracking_loop(
    session_id: Uuid,
    params: SessionParams,
    gateway: Arc<dyn TelemetryGateway>,
    settings: Arc<TrackingSettings>,
    publisher: StatePublisher,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut location = params.start;
    let mut sequence = 0u64;

    loop {
        location = advance(location, params.end);

        let fetched = tokio::select! {
            result = gateway.fetch_telemetry(location) => result,
            _ = &mut stop_rx => break,
        };

        let telemetry = match fetched {
            Ok(t) => t,
            Err(e) => {
                log::error!(
                    "Failed to fetch real-time data for session {}: {}",
                    session_id,
                    e
                );
                publisher.set_status(
                    session_id,
                    SessionStatus::Failed {
                        reason: e.to_string(),
                    },
                );
                return;
            }
        };

        let emissions_g = estimate_emissions(
            &settings.emission_factors,
            settings.tick_distance_m,
            params.vehicle,
            &telemetry,
            params.load_factor,
        );
        let remaining_m = distance_m(location, params.end);
        let eta_minutes = estimate_eta_minutes(remaining_m, &telemetry, settings.safety_factor);

        sequence += 1;
        publisher.publish(
            session_id,
            TrackingState {
                sequence,
                location,
                telemetry,
                emissions_g,
                eta_minutes,
                updated_at: Utc::now(),
            },
        );
        log::debug!(
            "Session {} tick {}: {:.1} g CO2, {:.1} min remaining ({:.0} m)",
            session_id,
            sequence,
            emissions_g,
            eta_minutes,
            remaining_m
        );

        let should_stop = tokio::select! {
            _ = tokio::time::sleep(settings.tick_interval) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }
    }

    publisher.set_status(session_id, SessionStatus::Stopped);
    log::info!("Tracking session {} stopped after {} ticks", session_id, sequence);
}
