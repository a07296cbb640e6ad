//! Per-run results and failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::RunPhase;

/// Note attached to runs whose duration could not be measured.
pub const ESTIMATED_DURATION_NOTE: &str = "Completed with estimated duration";

/// Outcome of one successful playback run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// 1-based position of the run within its session.
    pub run_number: u32,

    /// Video duration in seconds, or the estimate used when unknown.
    pub duration_seconds: f64,

    /// Whether the video was played through.
    pub completed: bool,

    /// Playback position when completion was detected.
    pub final_time_seconds: Option<f64>,

    /// Free-form annotation (e.g. estimated duration).
    pub note: Option<String>,

    /// When monitoring started.
    pub started_at: DateTime<Utc>,

    /// When completion was detected.
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// A run that played through a video of known duration.
    pub fn played_through(
        run_number: u32,
        duration_seconds: f64,
        final_time_seconds: f64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_number,
            duration_seconds,
            completed: true,
            final_time_seconds: Some(final_time_seconds),
            note: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// A run whose duration was never reported and was assumed instead.
    pub fn estimated(run_number: u32, assumed_seconds: f64, started_at: DateTime<Utc>) -> Self {
        Self {
            run_number,
            duration_seconds: assumed_seconds,
            completed: true,
            final_time_seconds: None,
            note: Some(ESTIMATED_DURATION_NOTE.to_string()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Returns true if the duration was assumed rather than measured.
    pub fn is_estimate(&self) -> bool {
        self.note.as_deref() == Some(ESTIMATED_DURATION_NOTE)
    }
}

/// A fatal failure of a single run.
///
/// The variant identifies the cause; [`RunError::phase`] tells which
/// phase of the run it came from.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunError {
    /// The provider library did not signal readiness in time.
    #[error("Player API failed to load within {after_secs} seconds")]
    ApiLoadTimeout { after_secs: u64 },

    /// The provider library reported a load failure.
    #[error("Failed to load player API: {reason}")]
    ApiLoadFailed { reason: String },

    /// Player construction did not complete in time.
    #[error("Player creation timed out after {after_secs} seconds")]
    PlayerCreationTimeout { after_secs: u64 },

    /// Player construction failed for a reason other than a playback error.
    #[error("Failed to create video player: {reason}")]
    PlayerCreationFailed { reason: String },

    /// The provider refused playback (region lock, privacy, removal, ...).
    #[error("Player error {code} (video may be private, restricted, or unavailable)")]
    ProviderPlayback { code: i32 },

    /// Playback took longer than the video duration plus slack.
    #[error("Playback timeout - no completion after {limit_secs} seconds")]
    MonitoringTimeout { limit_secs: u64 },

    /// The handle stopped answering mid-playback.
    #[error("Player became unavailable during playback: {reason}")]
    HandleUnavailable { reason: String },
}

impl RunError {
    /// Phase of the run this failure originated from.
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::ApiLoadTimeout { .. } | Self::ApiLoadFailed { .. } => RunPhase::ApiLoad,
            Self::PlayerCreationTimeout { .. }
            | Self::PlayerCreationFailed { .. }
            | Self::ProviderPlayback { .. } => RunPhase::PlayerCreation,
            Self::MonitoringTimeout { .. } | Self::HandleUnavailable { .. } => RunPhase::Monitoring,
        }
    }
}
