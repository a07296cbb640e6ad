//! PlayRun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - Any concrete player provider
//!
//! All types here describe playback sessions, their runs, and how they end.

pub mod error;
pub mod event;
pub mod ids;
pub mod run;
pub mod session;
pub mod status;

// Re-export commonly used types
pub use error::ValidationError;
pub use event::{SessionEvent, SessionEventKind};
pub use ids::{RunCount, SessionId, VideoRef};
pub use run::{RunError, RunResult, ESTIMATED_DURATION_NOTE};
pub use session::{SessionOutcome, SessionState};
pub use status::{PlaybackState, RunPhase, SessionStatus};
