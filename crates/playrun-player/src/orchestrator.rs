//! Run orchestrator: plays a video a requested number of times.

use std::sync::Arc;

use playrun_core::{
    RunCount, RunResult, SessionEvent, SessionEventKind, SessionId, SessionOutcome, SessionState,
    ValidationError, VideoRef,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SessionConfig;
use crate::monitor::PlaybackMonitor;
use crate::provider::PlayerProvider;
use crate::reporter::SessionReporter;

/// Final report of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub outcome: SessionOutcome,
    /// Results of the runs that completed, in run order.
    pub results: Vec<RunResult>,
}

/// A session running on its own task.
pub struct SessionHandle {
    pub session_id: SessionId,
    /// Every state change of the session, ending with `Finished`.
    pub events: UnboundedReceiverStream<SessionEvent>,
    /// Resolves to the final report.
    pub join: JoinHandle<SessionReport>,
    /// Cancels the session; the active player is released.
    pub cancel: CancellationToken,
}

/// Sequences playback runs for one video.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn PlayerProvider>,
    config: SessionConfig,
}

impl Orchestrator {
    /// Create an orchestrator with the default timing policy.
    pub fn new(provider: Arc<dyn PlayerProvider>) -> Self {
        Self {
            provider,
            config: SessionConfig::default(),
        }
    }

    /// Set the timing policy.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Validate raw user input and start a session on a new task.
    ///
    /// Nothing is spawned and the provider is never touched when the input
    /// is rejected.
    pub fn start(&self, video_url: &str, runs: &str) -> Result<SessionHandle, ValidationError> {
        let video = VideoRef::from_url(video_url)?;
        let total_runs: RunCount = runs.parse()?;
        Ok(self.spawn(video, total_runs, CancellationToken::new()))
    }

    /// Run a session on a new task, streaming its events.
    pub fn spawn(
        &self,
        video: VideoRef,
        total_runs: RunCount,
        cancel: CancellationToken,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = SessionId::generate();
        let mut reporter = SessionReporter::new(session_id.clone(), tx);
        let orchestrator = self.clone();
        let session_cancel = cancel.clone();

        let join = tokio::spawn(async move {
            orchestrator
                .run_session(&video, total_runs, &mut reporter, &session_cancel)
                .await
        });

        SessionHandle {
            session_id,
            events: UnboundedReceiverStream::new(rx),
            join,
            cancel,
        }
    }

    /// Play `video` `total_runs` times, one run after another.
    ///
    /// The first failing run aborts the session. Cancelling `cancel` stops
    /// the active run at its next suspension point. Either way the active
    /// player is released and the published state is reset to idle.
    pub async fn run_session(
        &self,
        video: &VideoRef,
        total_runs: RunCount,
        reporter: &mut SessionReporter,
        cancel: &CancellationToken,
    ) -> SessionReport {
        let total = total_runs.get();
        *reporter.state_mut() = SessionState::started(total);
        info!(
            session_id = %reporter.session_id(),
            video = %video,
            total_runs = total,
            "Starting playback session"
        );

        let mut monitor = PlaybackMonitor::new(Arc::clone(&self.provider), self.config.monitor.clone());
        let mut results = Vec::with_capacity(total as usize);
        let outcome = self
            .run_all(&mut monitor, video, total, reporter, cancel, &mut results)
            .await;
        monitor.settle().await;

        match &outcome {
            SessionOutcome::Complete { completed_runs } => {
                info!(session_id = %reporter.session_id(), completed_runs, "Playback session complete");
                reporter.state_mut().finish();
            }
            SessionOutcome::Failed { completed_runs, error } => {
                error!(
                    session_id = %reporter.session_id(),
                    completed_runs,
                    phase = %error.phase(),
                    error = %error,
                    "Playback session failed"
                );
                reporter.state_mut().reset();
            }
            SessionOutcome::Cancelled { completed_runs } => {
                warn!(session_id = %reporter.session_id(), completed_runs, "Playback session cancelled");
                reporter.state_mut().reset();
            }
        }
        reporter.emit(SessionEventKind::Finished {
            outcome: outcome.clone(),
        });

        SessionReport {
            session_id: reporter.session_id().clone(),
            outcome,
            results,
        }
    }

    async fn run_all(
        &self,
        monitor: &mut PlaybackMonitor,
        video: &VideoRef,
        total: u32,
        reporter: &mut SessionReporter,
        cancel: &CancellationToken,
        results: &mut Vec<RunResult>,
    ) -> SessionOutcome {
        let mut completed_runs = 0;

        for run_number in 1..=total {
            reporter.state_mut().begin_run(run_number);
            reporter.emit(SessionEventKind::RunStarted { run_number });

            let watched = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                watched = monitor.watch(video, run_number, reporter) => Some(watched),
            };

            match watched {
                None => return SessionOutcome::Cancelled { completed_runs },
                Some(Err(error)) => {
                    return SessionOutcome::Failed {
                        completed_runs,
                        error,
                    }
                }
                Some(Ok(result)) => {
                    completed_runs = run_number;
                    reporter.state_mut().complete_run(run_number);
                    reporter.emit(SessionEventKind::RunCompleted {
                        result: result.clone(),
                    });
                    results.push(result);
                }
            }

            if run_number < total {
                let delay = self.config.cooldown;
                reporter.emit(SessionEventKind::CoolingDown {
                    next_run: run_number + 1,
                    delay_ms: delay.as_millis() as u64,
                });
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return SessionOutcome::Cancelled { completed_runs },
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        SessionOutcome::Complete { completed_runs }
    }
}
