//! CLI configuration.

use std::time::Duration;

use playrun_player::{
    MonitorConfig, SessionConfig, SimulatedCreation, SimulatedLoad, SimulatedProvider,
    SimulatedVideo,
};

use crate::Cli;

/// Everything needed to build the provider and the orchestrator.
pub struct Config {
    /// Pause between runs.
    pub cooldown: Duration,

    /// Progress sampling period.
    pub sample_interval: Duration,

    /// Video served by the simulated provider.
    pub video: SimulatedVideo,

    /// How the simulated provider library loads.
    pub load: SimulatedLoad,

    /// How simulated players are constructed.
    pub creation: SimulatedCreation,
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            cooldown: session.cooldown,
            sample_interval: session.monitor.sample_interval,
            video: SimulatedVideo::new(30.0),
            load: SimulatedLoad::Ready,
            creation: SimulatedCreation::Ready,
        }
    }
}

impl Config {
    /// Build the config from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        let defaults = Self::default();
        Self {
            cooldown: cli.cooldown_secs,
            sample_interval: Duration::from_millis(cli.sample_ms.max(1)),
            video: SimulatedVideo::new(cli.sim_duration)
                .with_title(cli.sim_title.clone().or(defaults.video.title))
                .with_playback_rate(cli.sim_rate),
            load: if cli.sim_no_api {
                SimulatedLoad::Never
            } else {
                SimulatedLoad::Ready
            },
            creation: match cli.sim_error {
                Some(code) => SimulatedCreation::PlaybackError(code),
                None => SimulatedCreation::Ready,
            },
        }
    }

    /// Timing policy for the orchestrator.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_cooldown(self.cooldown)
            .with_monitor(MonitorConfig::default().with_sample_interval(self.sample_interval))
    }

    /// The provider runs are played against.
    pub fn provider(&self) -> SimulatedProvider {
        SimulatedProvider::new(self.video.clone())
            .with_load(self.load.clone())
            .with_creation(self.creation.clone())
    }
}
