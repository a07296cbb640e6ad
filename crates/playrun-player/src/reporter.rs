//! Publishing session state to the presentation layer.

use playrun_core::{SessionEvent, SessionEventKind, SessionId, SessionState};
use tokio::sync::mpsc;
use tracing::trace;

/// Owns the [`SessionState`] of one session and streams snapshots of it.
///
/// The orchestrator and the monitor are the only writers; everybody else
/// sees the clones carried by [`SessionEvent`]s.
#[derive(Debug)]
pub struct SessionReporter {
    session_id: SessionId,
    state: SessionState,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionReporter {
    /// Create a reporter that forwards events to `events`.
    pub fn new(session_id: SessionId, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            session_id,
            state: SessionState::default(),
            events: Some(events),
        }
    }

    /// Create a reporter that only tracks state.
    pub fn detached(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: SessionState::default(),
            events: None,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Publish an event with a snapshot of the current state.
    pub fn emit(&self, kind: SessionEventKind) {
        let Some(events) = &self.events else {
            return;
        };
        let event = SessionEvent::new(self.session_id.clone(), kind, self.state.clone());
        // Receiver might be dropped
        if events.send(event).is_err() {
            trace!(session_id = %self.session_id, "Session event dropped, no receiver");
        }
    }
}
