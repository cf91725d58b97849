use std::sync::Arc;
use tokio::sync::Mutex;

use crate::tracking::{Launcher, StatePublisher, TrackingController};

#[derive(Clone)]
pub struct AppState {
    /// Serializes start/stop requests.
    pub controller: Arc<Mutex<TrackingController>>,
    /// Read side; does not contend with start/stop.
    pub publisher: StatePublisher,
    pub launcher: Arc<Launcher>,
}

impl AppState {
    pub fn new(controller: TrackingController, launcher: Launcher) -> Self {
        Self {
            publisher: controller.publisher(),
            controller: Arc::new(Mutex::new(controller)),
            launcher: Arc::new(launcher),
        }
    }
}
