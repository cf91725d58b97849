use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{LiveView, SessionInfo, SessionStatus, TrackingState};

#[derive(Debug, Default)]
struct Shared {
    session: Option<SessionInfo>,
    state: Option<TrackingState>,
}

/// Holder of the current session and its latest snapshot. Writes replace
/// whole values under the lock, so readers never see a partial tick.
#[derive(Debug, Clone, Default)]
pub struct StatePublisher {
    shared: Arc<RwLock<Shared>>,
}

impl StatePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new current session and drops the previous snapshot.
    pub fn begin(&self, session: SessionInfo) {
        let mut locked = self.shared.write();
        locked.session = Some(session);
        locked.state = None;
    }

    /// Returns false when the snapshot belongs to another session or does not
    /// advance the sequence.
    pub fn publish(&self, session_id: Uuid, state: TrackingState) -> bool {
        let mut locked = self.shared.write();
        if !is_current(&locked, session_id) {
            return false;
        }
        if let Some(previous) = &locked.state {
            if state.sequence <= previous.sequence {
                return false;
            }
        }
        locked.state = Some(state);
        true
    }

    pub fn set_status(&self, session_id: Uuid, status: SessionStatus) -> bool {
        let mut locked = self.shared.write();
        if !is_current(&locked, session_id) {
            return false;
        }
        if let Some(session) = locked.session.as_mut() {
            session.status = status;
        }
        true
    }

    pub fn read(&self) -> LiveView {
        let locked = self.shared.read();
        LiveView {
            session: locked.session.clone(),
            state: locked.state.clone(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.shared
            .read()
            .session
            .as_ref()
            .map(|s| s.status.clone())
            .unwrap_or(SessionStatus::Idle)
    }
}

fn is_current(shared: &Shared, session_id: Uuid) -> bool {
    shared
        .session
        .as_ref()
        .is_some_and(|s| s.id == session_id)
}
