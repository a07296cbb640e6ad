//! Playback monitor: drives one video to completion.
//!
//! A run goes through three phases:
//!
//! 1. wait for the provider library ([`RunPhase::ApiLoad`]),
//! 2. construct a hidden player and read its metadata
//!    ([`RunPhase::PlayerCreation`]),
//! 3. start playback and sample the position on a fixed period until the
//!    video is done ([`RunPhase::Monitoring`]).
//!
//! [`RunPhase::ApiLoad`]: playrun_core::RunPhase::ApiLoad
//! [`RunPhase::PlayerCreation`]: playrun_core::RunPhase::PlayerCreation
//! [`RunPhase::Monitoring`]: playrun_core::RunPhase::Monitoring

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use playrun_core::{RunError, RunResult, SessionEventKind, VideoRef};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::ProviderError;
use crate::lease::PlayerLease;
use crate::provider::{
    PlayerEvent, PlayerEventReceiver, PlayerEventSender, PlayerHandle, PlayerOptions,
    PlayerProvider,
};
use crate::reporter::SessionReporter;

/// Title used when the provider does not report one.
pub const DEFAULT_TITLE: &str = "YouTube Video";

/// Drives single playback runs against a provider.
///
/// Runs are sequential: the monitor owns at most one player at a time and
/// a new run waits until the previous player has been destroyed.
pub struct PlaybackMonitor {
    provider: Arc<dyn PlayerProvider>,
    config: MonitorConfig,
    /// Player of the run in progress. Kept here rather than on the `watch`
    /// stack so a run abandoned midway leaves it for [`settle`] to destroy.
    ///
    /// [`settle`]: PlaybackMonitor::settle
    active: Option<PlayerLease>,
    pending_release: Option<JoinHandle<()>>,
}

impl PlaybackMonitor {
    /// Create a monitor for the given provider.
    pub fn new(provider: Arc<dyn PlayerProvider>, config: MonitorConfig) -> Self {
        Self {
            provider,
            config,
            active: None,
            pending_release: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Play `video` once, from load to completion.
    ///
    /// Progress and player state changes are written to `reporter`. On
    /// success the player is paused and destroyed after the release grace
    /// delay; on failure it is destroyed before this returns. If the
    /// returned future is dropped midway, the player is destroyed by the
    /// next call to [`settle`](PlaybackMonitor::settle) or `watch`.
    pub async fn watch(
        &mut self,
        video: &VideoRef,
        run_number: u32,
        reporter: &mut SessionReporter,
    ) -> Result<RunResult, RunError> {
        self.settle().await;

        info!(run_number, video = %video, "Starting playback run");

        self.wait_for_provider().await?;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let options = PlayerOptions::hidden(video.clone());
        let lease = self.create_player(options, events_tx).await?;
        let player = lease.shared();
        self.active = Some(lease);

        let outcome = self
            .play_through(player.as_ref(), &mut events_rx, run_number, reporter)
            .await;

        match outcome {
            Ok(result) => {
                self.release_active(self.config.release_grace);
                Ok(result)
            }
            Err(err) => {
                warn!(run_number, phase = %err.phase(), error = %err, "Playback run failed");
                self.release_active(Duration::ZERO);
                self.settle().await;
                Err(err)
            }
        }
    }

    /// Wait until every player handed out by this monitor is destroyed.
    ///
    /// Awaits a grace-delayed release from the previous run and destroys
    /// the player of a run that was abandoned before it finished. A
    /// release that is interrupted stays pending for the next call.
    pub async fn settle(&mut self) {
        loop {
            if let Some(release) = self.pending_release.as_mut() {
                if let Err(e) = release.await {
                    warn!(error = %e, "Player release task failed");
                }
                self.pending_release = None;
            }
            if self.active.is_none() {
                return;
            }
            debug!("Releasing player of an abandoned run");
            self.release_active(Duration::ZERO);
        }
    }

    /// Hand the active player to a release task tracked by `pending_release`.
    fn release_active(&mut self, grace: Duration) {
        if let Some(lease) = self.active.take() {
            debug!(?grace, "Scheduling player release");
            self.pending_release = Some(lease.release_after(grace));
        }
    }

    async fn play_through(
        &self,
        player: &dyn PlayerHandle,
        events: &mut PlayerEventReceiver,
        run_number: u32,
        reporter: &mut SessionReporter,
    ) -> Result<RunResult, RunError> {
        let (duration, title) =
            read_player_info(player)
                .await
                .map_err(|e| RunError::PlayerCreationFailed {
                    reason: format!("failed to get video data: {}", e),
                })?;

        info!(run_number, title = %title, duration_secs = duration, "Player ready");
        reporter.state_mut().set_player_info(title.clone(), duration);
        reporter.emit(SessionEventKind::PlayerReady {
            run_number,
            title,
            duration_seconds: duration,
        });

        player
            .play()
            .await
            .map_err(|e| RunError::HandleUnavailable {
                reason: e.to_string(),
            })?;

        let started_at = Utc::now();
        self.sample_until_done(player, events, duration, run_number, reporter, started_at)
            .await
    }

    async fn wait_for_provider(&self) -> Result<(), RunError> {
        let limit = self.config.api_load_timeout;
        match timeout(limit, self.provider.ready()).await {
            Err(_) => Err(RunError::ApiLoadTimeout {
                after_secs: limit.as_secs(),
            }),
            Ok(Err(e)) => Err(RunError::ApiLoadFailed {
                reason: e.to_string(),
            }),
            Ok(Ok(())) => Ok(()),
        }
    }

    async fn create_player(
        &self,
        options: PlayerOptions,
        events: PlayerEventSender,
    ) -> Result<PlayerLease, RunError> {
        let limit = self.config.player_creation_timeout;
        match timeout(limit, self.provider.create_player(options, events)).await {
            Err(_) => Err(RunError::PlayerCreationTimeout {
                after_secs: limit.as_secs(),
            }),
            Ok(Err(ProviderError::Playback { code })) => Err(RunError::ProviderPlayback { code }),
            Ok(Err(e)) => Err(RunError::PlayerCreationFailed {
                reason: e.to_string(),
            }),
            Ok(Ok(handle)) => Ok(PlayerLease::new(handle)),
        }
    }

    /// Sampling loop. The interval lives on this stack frame, so every exit
    /// (including the caller dropping the future) stops it.
    async fn sample_until_done(
        &self,
        player: &dyn PlayerHandle,
        events: &mut PlayerEventReceiver,
        captured_duration: f64,
        run_number: u32,
        reporter: &mut SessionReporter,
        started_at: DateTime<Utc>,
    ) -> Result<RunResult, RunError> {
        let mut ticker = tokio::time::interval(self.config.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let start = Instant::now();
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                event = events.recv(), if events_open => {
                    match event {
                        Some(PlayerEvent::StateChanged(playback)) => {
                            if let Some(playing) = playback.is_playing() {
                                reporter.state_mut().is_playing = playing;
                            }
                            reporter.emit(SessionEventKind::PlaybackStateChanged {
                                run_number,
                                playback,
                            });
                        }
                        Some(PlayerEvent::Error { code }) => {
                            warn!(run_number, code, "Provider reported an error during playback");
                        }
                        None => events_open = false,
                    }
                    continue;
                }
            }

            let elapsed = start.elapsed();
            let (current, duration) = match sample(player).await {
                Ok(sample) => sample,
                Err(e) => {
                    return Err(RunError::HandleUnavailable {
                        reason: e.to_string(),
                    })
                }
            };

            if !(duration.is_finite() && duration > 0.0) {
                if elapsed >= self.config.unknown_duration_limit {
                    pause_quietly(player).await;
                    let assumed = self.config.unknown_duration_limit.as_secs_f64();
                    info!(run_number, assumed_secs = assumed, "Duration never reported, assuming it");
                    return Ok(RunResult::estimated(run_number, assumed, started_at));
                }
                continue;
            }

            let progress = current / duration * 100.0;
            reporter.state_mut().record_progress(current, progress);
            reporter.emit(SessionEventKind::Progress { run_number });

            if current >= duration - self.config.end_tolerance_secs
                || progress >= self.config.completion_percent
            {
                pause_quietly(player).await;
                info!(run_number, final_time_secs = current, duration_secs = duration, "Playback complete");
                return Ok(RunResult::played_through(
                    run_number, duration, current, started_at,
                ));
            }

            let limit = self.config.watchdog_limit(captured_duration.max(duration));
            if elapsed > limit {
                pause_quietly(player).await;
                return Err(RunError::MonitoringTimeout {
                    limit_secs: limit.as_secs(),
                });
            }
        }
    }
}

async fn read_player_info(player: &dyn PlayerHandle) -> Result<(f64, String), ProviderError> {
    let duration = player.duration().await?;
    let title = player
        .metadata()
        .await?
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    Ok((duration, title))
}

async fn sample(player: &dyn PlayerHandle) -> Result<(f64, f64), ProviderError> {
    let current = player.current_time().await?;
    let duration = player.duration().await?;
    Ok((current, duration))
}

async fn pause_quietly(player: &dyn PlayerHandle) {
    if let Err(e) = player.pause().await {
        debug!(error = %e, "Ignoring pause failure");
    }
}
