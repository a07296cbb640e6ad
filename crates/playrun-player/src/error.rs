//! Error types reported by player providers.

use thiserror::Error;

/// Errors a [`PlayerProvider`](crate::PlayerProvider) or
/// [`PlayerHandle`](crate::PlayerHandle) implementation can return.
///
/// The monitor maps these onto [`RunError`](playrun_core::RunError)
/// variants depending on the phase the run is in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider library could not be loaded.
    #[error("Failed to load player API script: {0}")]
    LoadFailed(String),

    /// The provider refused to play the video (raw provider code).
    #[error("Provider playback error {code}")]
    Playback { code: i32 },

    /// The handle was unloaded by the provider.
    #[error("Player handle is no longer available")]
    Unavailable,

    /// Anything else the provider reports.
    #[error("{0}")]
    Other(String),
}
