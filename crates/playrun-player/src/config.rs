//! Timing policy for monitors and sessions.

use std::time::Duration;

/// Timing policy of a single playback run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// How long to wait for the provider library.
    pub api_load_timeout: Duration,

    /// How long to wait for a player to be constructed.
    pub player_creation_timeout: Duration,

    /// Period of the progress sampling timer.
    pub sample_interval: Duration,

    /// How long to play a video whose duration is never reported.
    pub unknown_duration_limit: Duration,

    /// Extra time on top of the video duration before giving up.
    pub watchdog_slack: Duration,

    /// Delay between pausing a finished player and destroying it.
    pub release_grace: Duration,

    /// A run is complete once the position is this close to the end (seconds).
    pub end_tolerance_secs: f64,

    /// A run is complete once progress reaches this percentage.
    pub completion_percent: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_load_timeout: Duration::from_secs(10),
            player_creation_timeout: Duration::from_secs(15),
            sample_interval: Duration::from_millis(500),
            unknown_duration_limit: Duration::from_secs(30),
            watchdog_slack: Duration::from_secs(30),
            release_grace: Duration::from_secs(1),
            end_tolerance_secs: 1.0,
            completion_percent: 99.0,
        }
    }
}

impl MonitorConfig {
    /// Builder method to set the sampling period.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Builder method to set the provider load timeout.
    pub fn with_api_load_timeout(mut self, timeout: Duration) -> Self {
        self.api_load_timeout = timeout;
        self
    }

    /// Builder method to set the player construction timeout.
    pub fn with_player_creation_timeout(mut self, timeout: Duration) -> Self {
        self.player_creation_timeout = timeout;
        self
    }

    /// Watchdog limit for a video of the given duration.
    pub fn watchdog_limit(&self, duration_secs: f64) -> Duration {
        Duration::try_from_secs_f64(duration_secs.max(0.0)).unwrap_or(Duration::MAX / 2)
            + self.watchdog_slack
    }
}

/// Timing policy of a whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Pause between two consecutive runs.
    pub cooldown: Duration,

    /// Policy applied to every run.
    pub monitor: MonitorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(2),
            monitor: MonitorConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Builder method to set the cool-down between runs.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Builder method to set the per-run policy.
    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }
}
