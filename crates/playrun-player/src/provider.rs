//! The boundary to the external player provider.
//!
//! A provider embeds a third-party media player. It needs some time to
//! become usable ([`PlayerProvider::ready`]), constructs one player per
//! video ([`PlayerProvider::create_player`]), and reports state changes and
//! errors asynchronously through a [`PlayerEventSender`].

use async_trait::async_trait;
use playrun_core::{PlaybackState, VideoRef};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::ProviderError;

/// Notification pushed by a player after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Player state changed (playing, paused, ended, ...).
    StateChanged(PlaybackState),
    /// The provider reported an error with its raw code.
    Error { code: i32 },
}

/// Sending half of a player's notification channel.
pub type PlayerEventSender = mpsc::UnboundedSender<PlayerEvent>;

/// Receiving half of a player's notification channel.
pub type PlayerEventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

/// Options used to construct a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerOptions {
    pub video: VideoRef,
    pub width: u32,
    pub height: u32,
    pub autoplay: bool,
    pub controls: bool,
    pub keyboard: bool,
    pub fullscreen: bool,
    pub modest_branding: bool,
    pub related_videos: bool,
}

impl PlayerOptions {
    /// A zero-sized player with every piece of chrome turned off.
    pub fn hidden(video: VideoRef) -> Self {
        Self {
            video,
            width: 0,
            height: 0,
            autoplay: true,
            controls: false,
            keyboard: false,
            fullscreen: false,
            modest_branding: true,
            related_videos: false,
        }
    }
}

/// Metadata read from a constructed player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: Option<String>,
}

/// A provider capable of embedding players.
///
/// Readiness is an injected dependency: callers await [`ready`] instead of
/// relying on a process-wide "library loaded" callback.
///
/// [`ready`]: PlayerProvider::ready
#[async_trait]
pub trait PlayerProvider: Send + Sync {
    /// Resolves once the provider library is usable.
    async fn ready(&self) -> Result<(), ProviderError>;

    /// Construct a player and wait until it is ready for commands.
    ///
    /// Playback errors reported before the player is ready (private or
    /// region-locked videos, ...) are returned as
    /// [`ProviderError::Playback`]. Later notifications go to `events`.
    async fn create_player(
        &self,
        options: PlayerOptions,
        events: PlayerEventSender,
    ) -> Result<Box<dyn PlayerHandle>, ProviderError>;
}

/// A provider-managed player instance.
///
/// Times are in seconds. A duration of zero means the provider does not
/// know it (yet).
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    async fn play(&self) -> Result<(), ProviderError>;

    async fn pause(&self) -> Result<(), ProviderError>;

    async fn current_time(&self) -> Result<f64, ProviderError>;

    async fn duration(&self) -> Result<f64, ProviderError>;

    async fn metadata(&self) -> Result<VideoMetadata, ProviderError>;

    /// Release the player. Called exactly once per handle.
    async fn destroy(&self) -> Result<(), ProviderError>;
}
