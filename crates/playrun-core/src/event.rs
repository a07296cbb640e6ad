//! Session events streamed to the presentation layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;
use crate::run::RunResult;
use crate::session::{SessionOutcome, SessionState};
use crate::status::PlaybackState;

/// A session event together with the state snapshot taken when it fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Session this event belongs to.
    pub session_id: SessionId,
    /// What happened.
    pub kind: SessionEventKind,
    /// Unix timestamp (milliseconds) when the event fired.
    pub timestamp_ms: i64,
    /// Session state right after the event was applied.
    pub state: SessionState,
}

impl SessionEvent {
    /// Create a new session event stamped with the current time.
    pub fn new(session_id: SessionId, kind: SessionEventKind, state: SessionState) -> Self {
        Self {
            session_id,
            kind,
            timestamp_ms: Utc::now().timestamp_millis(),
            state,
        }
    }

    /// Returns true for the last event of a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SessionEventKind::Finished { .. })
    }
}

/// Type of session event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// A run is about to load the provider.
    RunStarted { run_number: u32 },
    /// The player for the current run was constructed.
    PlayerReady {
        run_number: u32,
        title: String,
        duration_seconds: f64,
    },
    /// The provider reported a player state change.
    PlaybackStateChanged {
        run_number: u32,
        playback: PlaybackState,
    },
    /// A progress sample was taken.
    Progress { run_number: u32 },
    /// A run finished successfully.
    RunCompleted { result: RunResult },
    /// Waiting before the next run.
    CoolingDown { next_run: u32, delay_ms: u64 },
    /// The session ended.
    Finished { outcome: SessionOutcome },
}
