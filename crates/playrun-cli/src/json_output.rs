//! JSON output for streaming session events to stdout.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use playrun_core::{SessionEvent, SessionEventKind, ValidationError};
use serde::Serialize;

/// Global flag to enable JSON output mode.
static JSON_MODE_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable JSON output mode.
pub fn enable_json_mode() {
    JSON_MODE_ENABLED.store(true, Ordering::SeqCst);
}

/// Check if JSON mode is enabled.
pub fn is_json_mode() -> bool {
    JSON_MODE_ENABLED.load(Ordering::SeqCst)
}

/// JSON event types that can be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonEventType {
    RunStarted,
    PlayerReady,
    PlaybackStateChanged,
    Progress,
    RunCompleted,
    CoolingDown,
    SessionFinished,
    ValidationFailed,
}

impl From<&SessionEventKind> for JsonEventType {
    fn from(kind: &SessionEventKind) -> Self {
        match kind {
            SessionEventKind::RunStarted { .. } => Self::RunStarted,
            SessionEventKind::PlayerReady { .. } => Self::PlayerReady,
            SessionEventKind::PlaybackStateChanged { .. } => Self::PlaybackStateChanged,
            SessionEventKind::Progress { .. } => Self::Progress,
            SessionEventKind::RunCompleted { .. } => Self::RunCompleted,
            SessionEventKind::CoolingDown { .. } => Self::CoolingDown,
            SessionEventKind::Finished { .. } => Self::SessionFinished,
        }
    }
}

/// A JSON event to be output to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEvent {
    pub event: JsonEventType,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl JsonEvent {
    /// Create a new JSON event with the current timestamp.
    pub fn new(event: JsonEventType, data: serde_json::Value) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }

    /// Output this event as a JSON line to stdout.
    pub fn emit(&self) {
        if !is_json_mode() {
            return;
        }
        if let Ok(json) = serde_json::to_string(self) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }
}

/// Build the JSON line for a session event.
pub fn session_event(event: &SessionEvent) -> JsonEvent {
    JsonEvent::new(
        JsonEventType::from(&event.kind),
        serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
    )
}

/// Emit a session event.
pub fn emit_session_event(event: &SessionEvent) {
    session_event(event).emit();
}

/// Emit a validation_failed event.
pub fn emit_validation_failed(error: &ValidationError) {
    JsonEvent::new(
        JsonEventType::ValidationFailed,
        serde_json::json!({
            "message": error.to_string(),
        }),
    )
    .emit();
}
