//! Playback engine for PlayRun
//!
//! This crate drives an external player provider: the [`PlaybackMonitor`]
//! plays one video to completion while sampling its progress, and the
//! [`Orchestrator`] repeats that for a whole session.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use playrun_player::{Orchestrator, SimulatedProvider, SimulatedVideo};
//! use tokio_stream::StreamExt;
//!
//! async fn play() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(42.0)));
//!     let orchestrator = Orchestrator::new(provider);
//!
//!     let mut session = orchestrator.start("https://youtu.be/abc123", "2")?;
//!     while let Some(event) = session.events.next().await {
//!         println!("{:?}", event.kind);
//!     }
//!
//!     let report = session.join.await?;
//!     println!("Completed runs: {}", report.outcome.completed_runs());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod lease;
mod monitor;
mod orchestrator;
mod provider;
mod reporter;
mod simulated;

// Re-export main types
pub use config::{MonitorConfig, SessionConfig};
pub use error::ProviderError;
pub use monitor::{PlaybackMonitor, DEFAULT_TITLE};
pub use orchestrator::{Orchestrator, SessionHandle, SessionReport};
pub use provider::{
    PlayerEvent, PlayerEventReceiver, PlayerEventSender, PlayerHandle, PlayerOptions,
    PlayerProvider, VideoMetadata,
};
pub use reporter::SessionReporter;
pub use simulated::{
    SimulatedCreation, SimulatedLoad, SimulatedProvider, SimulatedVideo, SimulationStats,
};
