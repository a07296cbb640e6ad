//! A clock-driven stand-in for a real player provider.
//!
//! Positions advance with tokio's clock, so sessions against it behave the
//! same way under paused test time as they do in real time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use playrun_core::PlaybackState;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::ProviderError;
use crate::provider::{
    PlayerEvent, PlayerEventSender, PlayerHandle, PlayerOptions, PlayerProvider, VideoMetadata,
};

/// The video every simulated player plays.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedVideo {
    pub title: Option<String>,
    /// Zero means the provider never reports a duration.
    pub duration_seconds: f64,
    /// Media seconds per wall-clock second.
    pub playback_rate: f64,
}

impl SimulatedVideo {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            title: Some("Simulated video".to_string()),
            duration_seconds,
            playback_rate: 1.0,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = rate;
        self
    }
}

/// How the provider library becomes ready.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedLoad {
    Ready,
    Delayed(Duration),
    /// Never signals readiness.
    Never,
    Fails(String),
}

/// How one player construction behaves.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedCreation {
    Ready,
    Delayed(Duration),
    /// Never finishes constructing.
    Hang,
    /// The provider refuses playback with this code.
    PlaybackError(i32),
    /// Constructed, but unloaded this long after construction.
    UnavailableAfter(Duration),
}

/// Counters describing what happened to simulated players.
#[derive(Debug, Default)]
pub struct SimulationStats {
    created: AtomicU32,
    destroyed: AtomicU32,
    alive: AtomicU32,
    max_alive: AtomicU32,
    duplicate_destroys: AtomicU32,
}

impl SimulationStats {
    /// Players successfully constructed.
    pub fn created(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }

    /// Players destroyed (first destroy call only).
    pub fn destroyed(&self) -> u32 {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Largest number of players alive at the same time.
    pub fn max_alive(&self) -> u32 {
        self.max_alive.load(Ordering::SeqCst)
    }

    /// Destroy calls on players that were already destroyed.
    pub fn duplicate_destroys(&self) -> u32 {
        self.duplicate_destroys.load(Ordering::SeqCst)
    }

    fn on_created(&self) {
        self.created.fetch_add(1, Ordering::SeqCst);
        let alive = self.alive.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_alive.fetch_max(alive, Ordering::SeqCst);
    }

    fn on_destroyed(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        self.alive.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Simulated provider serving one video.
pub struct SimulatedProvider {
    video: SimulatedVideo,
    load: SimulatedLoad,
    creation: SimulatedCreation,
    overrides: HashMap<u32, SimulatedCreation>,
    attempts: AtomicU32,
    stats: Arc<SimulationStats>,
}

impl SimulatedProvider {
    pub fn new(video: SimulatedVideo) -> Self {
        Self {
            video,
            load: SimulatedLoad::Ready,
            creation: SimulatedCreation::Ready,
            overrides: HashMap::new(),
            attempts: AtomicU32::new(0),
            stats: Arc::new(SimulationStats::default()),
        }
    }

    /// Builder method to set the library load behaviour.
    pub fn with_load(mut self, load: SimulatedLoad) -> Self {
        self.load = load;
        self
    }

    /// Builder method to set how every player is constructed.
    pub fn with_creation(mut self, creation: SimulatedCreation) -> Self {
        self.creation = creation;
        self
    }

    /// Builder method to override construction of the `attempt`-th player (1-based).
    pub fn with_creation_at(mut self, attempt: u32, creation: SimulatedCreation) -> Self {
        self.overrides.insert(attempt, creation);
        self
    }

    pub fn stats(&self) -> Arc<SimulationStats> {
        Arc::clone(&self.stats)
    }

    /// Construction attempts so far, including failed ones.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlayerProvider for SimulatedProvider {
    async fn ready(&self) -> Result<(), ProviderError> {
        match &self.load {
            SimulatedLoad::Ready => Ok(()),
            SimulatedLoad::Delayed(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            SimulatedLoad::Never => std::future::pending().await,
            SimulatedLoad::Fails(reason) => Err(ProviderError::LoadFailed(reason.clone())),
        }
    }

    async fn create_player(
        &self,
        options: PlayerOptions,
        events: PlayerEventSender,
    ) -> Result<Box<dyn PlayerHandle>, ProviderError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let creation = self.overrides.get(&attempt).unwrap_or(&self.creation);
        debug!(attempt, video = %options.video, ?creation, "Creating simulated player");

        let unavailable_after = match creation {
            SimulatedCreation::Ready => None,
            SimulatedCreation::Delayed(delay) => {
                tokio::time::sleep(*delay).await;
                None
            }
            SimulatedCreation::Hang => std::future::pending().await,
            SimulatedCreation::PlaybackError(code) => {
                return Err(ProviderError::Playback { code: *code })
            }
            SimulatedCreation::UnavailableAfter(after) => Some(*after),
        };

        self.stats.on_created();
        let player = SimulatedPlayer {
            video: self.video.clone(),
            clock: Mutex::new(PlayerClock::default()),
            events,
            unavailable_after,
            created_at: Instant::now(),
            stats: Arc::clone(&self.stats),
        };
        player.emit(PlaybackState::Unstarted);
        Ok(Box::new(player))
    }
}

#[derive(Debug, Default)]
struct PlayerClock {
    /// Media position accumulated while previously playing.
    position: f64,
    playing_since: Option<Instant>,
    ended: bool,
    destroyed: bool,
}

struct SimulatedPlayer {
    video: SimulatedVideo,
    clock: Mutex<PlayerClock>,
    events: PlayerEventSender,
    unavailable_after: Option<Duration>,
    created_at: Instant,
    stats: Arc<SimulationStats>,
}

impl SimulatedPlayer {
    fn emit(&self, state: PlaybackState) {
        trace!(?state, "Simulated player state change");
        self.events.send(PlayerEvent::StateChanged(state)).ok();
    }

    fn clock(&self) -> std::sync::MutexGuard<'_, PlayerClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_usable(&self, clock: &PlayerClock) -> Result<(), ProviderError> {
        if clock.destroyed {
            return Err(ProviderError::Unavailable);
        }
        match self.unavailable_after {
            Some(after) if self.created_at.elapsed() >= after => Err(ProviderError::Unavailable),
            _ => Ok(()),
        }
    }

    fn position(&self, clock: &PlayerClock) -> f64 {
        let playing = clock
            .playing_since
            .map(|since| since.elapsed().as_secs_f64() * self.video.playback_rate)
            .unwrap_or(0.0);
        let position = clock.position + playing;
        if self.video.duration_seconds > 0.0 {
            position.min(self.video.duration_seconds)
        } else {
            position
        }
    }
}

#[async_trait]
impl PlayerHandle for SimulatedPlayer {
    async fn play(&self) -> Result<(), ProviderError> {
        {
            let mut clock = self.clock();
            self.check_usable(&clock)?;
            if clock.playing_since.is_some() {
                return Ok(());
            }
            clock.playing_since = Some(Instant::now());
        }
        self.emit(PlaybackState::Playing);
        Ok(())
    }

    async fn pause(&self) -> Result<(), ProviderError> {
        {
            let mut clock = self.clock();
            self.check_usable(&clock)?;
            if clock.playing_since.is_none() {
                return Ok(());
            }
            clock.position = self.position(&clock);
            clock.playing_since = None;
        }
        self.emit(PlaybackState::Paused);
        Ok(())
    }

    async fn current_time(&self) -> Result<f64, ProviderError> {
        let (position, just_ended) = {
            let mut clock = self.clock();
            self.check_usable(&clock)?;
            let position = self.position(&clock);
            let reached_end =
                self.video.duration_seconds > 0.0 && position >= self.video.duration_seconds;
            let just_ended = reached_end && !clock.ended;
            if just_ended {
                clock.ended = true;
                clock.position = position;
                clock.playing_since = None;
            }
            (position, just_ended)
        };
        if just_ended {
            self.emit(PlaybackState::Ended);
        }
        Ok(position)
    }

    async fn duration(&self) -> Result<f64, ProviderError> {
        self.check_usable(&self.clock())?;
        Ok(self.video.duration_seconds.max(0.0))
    }

    async fn metadata(&self) -> Result<VideoMetadata, ProviderError> {
        self.check_usable(&self.clock())?;
        Ok(VideoMetadata {
            title: self.video.title.clone(),
        })
    }

    async fn destroy(&self) -> Result<(), ProviderError> {
        let mut clock = self.clock();
        if clock.destroyed {
            self.stats.duplicate_destroys.fetch_add(1, Ordering::SeqCst);
            return Err(ProviderError::Unavailable);
        }
        clock.destroyed = true;
        clock.playing_since = None;
        self.stats.on_destroyed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playrun_core::VideoRef;
    use tokio::sync::mpsc;

    fn options() -> PlayerOptions {
        PlayerOptions::hidden(VideoRef::from_url("https://youtu.be/sim").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_follows_clock() {
        let provider = SimulatedProvider::new(SimulatedVideo::new(10.0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = provider.create_player(options(), tx).await.unwrap();

        player.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!((player.current_time().await.unwrap() - 4.0).abs() < 1e-6);

        player.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!((player.current_time().await.unwrap() - 4.0).abs() < 1e-6);

        assert_eq!(
            rx.try_recv().unwrap(),
            PlayerEvent::StateChanged(PlaybackState::Unstarted)
        );
        assert_eq!(rx.try_recv().unwrap(), PlayerEvent::StateChanged(PlaybackState::Playing));
        assert_eq!(rx.try_recv().unwrap(), PlayerEvent::StateChanged(PlaybackState::Paused));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ends_at_duration() {
        let provider = SimulatedProvider::new(SimulatedVideo::new(3.0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = provider.create_player(options(), tx).await.unwrap();

        player.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(player.current_time().await.unwrap(), 3.0);

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events.last(),
            Some(&PlayerEvent::StateChanged(PlaybackState::Ended))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_is_tracked() {
        let provider = SimulatedProvider::new(SimulatedVideo::new(3.0));
        let stats = provider.stats();
        let (tx, _rx) = mpsc::unbounded_channel();
        let player = provider.create_player(options(), tx).await.unwrap();

        assert_eq!(stats.created(), 1);
        player.destroy().await.unwrap();
        assert!(player.destroy().await.is_err());
        assert_eq!(stats.destroyed(), 1);
        assert_eq!(stats.duplicate_destroys(), 1);
        assert_eq!(player.current_time().await, Err(ProviderError::Unavailable));
    }

    #[tokio::test]
    async fn test_playback_error_on_creation() {
        let provider = SimulatedProvider::new(SimulatedVideo::new(3.0))
            .with_creation_at(2, SimulatedCreation::PlaybackError(150));
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(provider.create_player(options(), tx.clone()).await.is_ok());
        assert!(matches!(
            provider.create_player(options(), tx).await,
            Err(ProviderError::Playback { code: 150 })
        ));
        assert_eq!(provider.attempts(), 2);
        assert_eq!(provider.stats().created(), 1);
    }
}
