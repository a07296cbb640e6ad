//! Session-level state and outcome.

use serde::{Deserialize, Serialize};

use crate::run::RunError;
use crate::status::SessionStatus;

/// Snapshot of a session, published to the presentation layer.
///
/// Only the orchestrator and the monitor mutate it; everybody else gets
/// clones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    pub current_run: u32,
    pub completed_runs: u32,
    pub total_runs: u32,
    /// Progress of the current run, 0..=100.
    pub progress_percent: f64,
    pub current_time_seconds: f64,
    pub total_duration_seconds: f64,
    pub video_title: Option<String>,
    pub is_playing: bool,
}

impl SessionState {
    /// State of a freshly started session.
    pub fn started(total_runs: u32) -> Self {
        Self {
            status: SessionStatus::Processing,
            total_runs,
            ..Self::default()
        }
    }

    /// Enter run `run_number`, clearing per-run progress.
    pub fn begin_run(&mut self, run_number: u32) {
        self.current_run = run_number;
        self.progress_percent = 0.0;
        self.current_time_seconds = 0.0;
        self.is_playing = false;
    }

    /// Record the metadata captured once the player is ready.
    pub fn set_player_info(&mut self, title: impl Into<String>, duration_seconds: f64) {
        self.video_title = Some(title.into());
        self.total_duration_seconds = duration_seconds;
    }

    /// Record one progress sample.
    pub fn record_progress(&mut self, current_time_seconds: f64, progress_percent: f64) {
        self.current_time_seconds = current_time_seconds;
        self.progress_percent = progress_percent.clamp(0.0, 100.0);
    }

    /// Record that run `run_number` finished successfully.
    pub fn complete_run(&mut self, run_number: u32) {
        self.completed_runs = run_number;
        self.is_playing = false;
    }

    /// Mark every run as done.
    pub fn finish(&mut self) {
        self.status = SessionStatus::Complete;
        self.is_playing = false;
    }

    /// Return to idle, clearing all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Share of requested runs already completed, 0..=100.
    pub fn overall_percent(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        f64::from(self.completed_runs) / f64::from(self.total_runs) * 100.0
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every requested run completed.
    Complete { completed_runs: u32 },
    /// A run failed; later runs were skipped.
    Failed { completed_runs: u32, error: RunError },
    /// The caller tore the session down.
    Cancelled { completed_runs: u32 },
}

impl SessionOutcome {
    /// Runs that completed before the session ended.
    pub fn completed_runs(&self) -> u32 {
        match self {
            Self::Complete { completed_runs }
            | Self::Failed { completed_runs, .. }
            | Self::Cancelled { completed_runs } => *completed_runs,
        }
    }

    /// Returns true if every requested run completed.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// The failure, if the session failed.
    pub fn error(&self) -> Option<&RunError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
