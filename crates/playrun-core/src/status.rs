//! Status enums for sessions, runs, and the external player.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a playback session as seen by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// No session running; counters are zeroed.
    #[default]
    Idle,
    /// Runs are being played.
    Processing,
    /// Every requested run completed.
    Complete,
}

impl SessionStatus {
    /// Returns true while runs are still being played.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

/// Player state reported through the provider's state-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Loaded but never started.
    Unstarted,
    /// Actively playing.
    Playing,
    /// Paused by us or by the provider.
    Paused,
    /// Reached the end of the video.
    Ended,
    /// Waiting for data.
    Buffering,
    /// Video cued but not playing.
    Cued,
}

impl PlaybackState {
    /// What a state change means for the `is_playing` flag.
    ///
    /// `None` means the flag is left unchanged.
    pub fn is_playing(&self) -> Option<bool> {
        match self {
            Self::Playing => Some(true),
            Self::Paused | Self::Ended => Some(false),
            Self::Unstarted | Self::Buffering | Self::Cued => None,
        }
    }
}

/// Phase of a run in which a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Waiting for the provider library to become ready.
    ApiLoad,
    /// Constructing the player for the target video.
    PlayerCreation,
    /// Sampling playback progress.
    Monitoring,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApiLoad => "api-load",
            Self::PlayerCreation => "player-creation",
            Self::Monitoring => "monitoring",
        };
        f.write_str(name)
    }
}
