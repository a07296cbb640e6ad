//! Playback monitor behaviour under paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use playrun_core::{
    PlaybackState, RunError, RunPhase, SessionEventKind, SessionId, SessionState, VideoRef,
};
use playrun_player::{
    MonitorConfig, PlaybackMonitor, SessionReporter, SimulatedCreation, SimulatedLoad,
    SimulatedProvider, SimulatedVideo, DEFAULT_TITLE,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

fn video() -> VideoRef {
    VideoRef::from_url("https://youtu.be/abc123?t=5").unwrap()
}

fn monitor_for(provider: &Arc<SimulatedProvider>) -> PlaybackMonitor {
    PlaybackMonitor::new(provider.clone(), MonitorConfig::default())
}

fn reporter() -> SessionReporter {
    let mut reporter = SessionReporter::detached(SessionId::generate());
    *reporter.state_mut() = SessionState::started(1);
    reporter.state_mut().begin_run(1);
    reporter
}

fn secs(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64()
}

#[tokio::test(start_paused = true)]
async fn resolves_within_one_period_of_reaching_the_end() {
    let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(10.0)));
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    let start = Instant::now();
    let result = monitor.watch(&video(), 1, &mut reporter).await.unwrap();
    let elapsed = secs(start.elapsed());

    // Position crosses duration - 1 at 9s.
    assert!((9.0..=9.5).contains(&elapsed), "resolved after {}s", elapsed);
    assert_eq!(result.run_number, 1);
    assert!(result.completed);
    assert_eq!(result.duration_seconds, 10.0);
    let final_time = result.final_time_seconds.unwrap();
    assert!(final_time >= 9.0 && final_time <= 10.0);
    assert!(!result.is_estimate());

    assert_eq!(reporter.state().total_duration_seconds, 10.0);
    assert!(reporter.state().progress_percent >= 90.0);
}

#[tokio::test(start_paused = true)]
async fn releases_player_after_grace_delay() {
    let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(4.0)));
    let stats = provider.stats();
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    monitor.watch(&video(), 1, &mut reporter).await.unwrap();
    assert_eq!(stats.created(), 1);
    assert_eq!(stats.destroyed(), 0, "release waits for the grace delay");

    let before = Instant::now();
    monitor.settle().await;
    let waited = secs(before.elapsed());
    assert!((1.0..1.1).contains(&waited), "waited {}s", waited);
    assert_eq!(stats.destroyed(), 1);
    assert_eq!(stats.duplicate_destroys(), 0);
}

#[tokio::test(start_paused = true)]
async fn unknown_duration_completes_with_estimate_after_thirty_seconds() {
    let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(0.0)));
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    let start = Instant::now();
    let result = monitor.watch(&video(), 3, &mut reporter).await.unwrap();
    let elapsed = secs(start.elapsed());

    assert!((30.0..=30.5).contains(&elapsed), "resolved after {}s", elapsed);
    assert_eq!(result.run_number, 3);
    assert!(result.completed);
    assert_eq!(result.duration_seconds, 30.0);
    assert!(result.is_estimate());
    assert_eq!(result.final_time_seconds, None);
}

#[tokio::test(start_paused = true)]
async fn api_load_that_never_signals_times_out_at_ten_seconds() {
    let provider = Arc::new(
        SimulatedProvider::new(SimulatedVideo::new(10.0)).with_load(SimulatedLoad::Never),
    );
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    let start = Instant::now();
    let err = monitor.watch(&video(), 1, &mut reporter).await.unwrap_err();
    let elapsed = secs(start.elapsed());

    assert!((10.0..10.1).contains(&elapsed), "failed after {}s", elapsed);
    assert_eq!(err, RunError::ApiLoadTimeout { after_secs: 10 });
    assert_eq!(err.phase(), RunPhase::ApiLoad);
    assert_eq!(provider.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn api_load_failure_is_reported() {
    let provider = Arc::new(
        SimulatedProvider::new(SimulatedVideo::new(10.0))
            .with_load(SimulatedLoad::Fails("script blocked".to_string())),
    );
    let mut monitor = monitor_for(&provider);

    let err = monitor.watch(&video(), 1, &mut reporter()).await.unwrap_err();
    assert!(matches!(err, RunError::ApiLoadFailed { ref reason } if reason.contains("script blocked")));
    assert_eq!(err.phase(), RunPhase::ApiLoad);
}

#[tokio::test(start_paused = true)]
async fn player_creation_times_out_at_fifteen_seconds() {
    let provider = Arc::new(
        SimulatedProvider::new(SimulatedVideo::new(10.0)).with_creation(SimulatedCreation::Hang),
    );
    let mut monitor = monitor_for(&provider);

    let start = Instant::now();
    let err = monitor.watch(&video(), 1, &mut reporter()).await.unwrap_err();
    let elapsed = secs(start.elapsed());

    assert!((15.0..15.1).contains(&elapsed), "failed after {}s", elapsed);
    assert_eq!(err, RunError::PlayerCreationTimeout { after_secs: 15 });
    assert_eq!(err.phase(), RunPhase::PlayerCreation);
}

#[tokio::test(start_paused = true)]
async fn provider_playback_error_surfaces_raw_code() {
    let provider = Arc::new(
        SimulatedProvider::new(SimulatedVideo::new(10.0))
            .with_creation(SimulatedCreation::PlaybackError(150)),
    );
    let stats = provider.stats();
    let mut monitor = monitor_for(&provider);

    let err = monitor.watch(&video(), 1, &mut reporter()).await.unwrap_err();

    assert_eq!(err, RunError::ProviderPlayback { code: 150 });
    assert_eq!(err.phase(), RunPhase::PlayerCreation);
    assert!(err.to_string().contains("150"));
    assert_eq!(stats.created(), 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_playback_hits_the_watchdog() {
    let provider = Arc::new(SimulatedProvider::new(
        SimulatedVideo::new(10.0).with_playback_rate(0.0),
    ));
    let stats = provider.stats();
    let mut monitor = monitor_for(&provider);

    let start = Instant::now();
    let err = monitor.watch(&video(), 1, &mut reporter()).await.unwrap_err();
    let elapsed = secs(start.elapsed());

    // Limit is duration + 30s; first sample past it fails.
    assert!((40.0..=41.0).contains(&elapsed), "failed after {}s", elapsed);
    assert_eq!(err, RunError::MonitoringTimeout { limit_secs: 40 });
    assert_eq!(err.phase(), RunPhase::Monitoring);
    assert_eq!(stats.destroyed(), 1);
}

#[tokio::test(start_paused = true)]
async fn unloaded_handle_fails_and_is_destroyed_once() {
    let provider = Arc::new(
        SimulatedProvider::new(SimulatedVideo::new(60.0))
            .with_creation(SimulatedCreation::UnavailableAfter(Duration::from_secs(3))),
    );
    let stats = provider.stats();
    let mut monitor = monitor_for(&provider);

    let err = monitor.watch(&video(), 1, &mut reporter()).await.unwrap_err();

    assert!(matches!(err, RunError::HandleUnavailable { .. }));
    assert_eq!(err.phase(), RunPhase::Monitoring);
    assert_eq!(stats.created(), 1);
    assert_eq!(stats.destroyed(), 1);
    assert_eq!(stats.duplicate_destroys(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_title_falls_back_to_default() {
    let provider = Arc::new(SimulatedProvider::new(
        SimulatedVideo::new(2.0).with_title(None),
    ));
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    monitor.watch(&video(), 1, &mut reporter).await.unwrap();
    assert_eq!(reporter.state().video_title.as_deref(), Some(DEFAULT_TITLE));
}

#[tokio::test(start_paused = true)]
async fn publishes_player_state_and_progress() {
    let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(5.0)));
    let mut monitor = monitor_for(&provider);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut reporter = SessionReporter::new(SessionId::generate(), tx);
    *reporter.state_mut() = SessionState::started(1);

    monitor.watch(&video(), 1, &mut reporter).await.unwrap();
    drop(reporter);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(
        events.first().map(|e| &e.kind),
        Some(SessionEventKind::PlayerReady { title, duration_seconds, .. })
            if title == "Simulated video" && *duration_seconds == 5.0
    ));

    let playing = events
        .iter()
        .find(|e| {
            matches!(
                e.kind,
                SessionEventKind::PlaybackStateChanged {
                    playback: PlaybackState::Playing,
                    ..
                }
            )
        })
        .expect("playing notification");
    assert!(playing.state.is_playing);

    let progress: Vec<f64> = events
        .iter()
        .filter(|e| matches!(e.kind, SessionEventKind::Progress { .. }))
        .map(|e| e.state.progress_percent)
        .collect();
    assert!(progress.len() >= 8, "expected a sample every 500ms");
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn long_video_completes_at_ninety_nine_percent() {
    let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(300.0)));
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    let start = Instant::now();
    let result = monitor.watch(&video(), 1, &mut reporter).await.unwrap();
    let elapsed = secs(start.elapsed());

    // 99% of 300s is 297s, two seconds before the end tolerance kicks in.
    assert!((297.0..=297.5).contains(&elapsed), "resolved after {}s", elapsed);
    let final_time = result.final_time_seconds.unwrap();
    assert!(final_time < 299.0, "stopped at {}s", final_time);
    assert!(reporter.state().progress_percent >= 98.99);
    assert!(!result.is_estimate());
}

#[tokio::test(start_paused = true)]
async fn abandoned_run_is_destroyed_by_settle() {
    let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(60.0)));
    let stats = provider.stats();
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    let watched = tokio::time::timeout(
        Duration::from_secs(5),
        monitor.watch(&video(), 1, &mut reporter),
    )
    .await;
    assert!(watched.is_err(), "run should still be playing");
    assert_eq!(stats.created(), 1);

    let before = Instant::now();
    monitor.settle().await;
    assert!(before.elapsed() < Duration::from_millis(10), "no grace delay");
    assert_eq!(stats.destroyed(), 1);
    assert_eq!(stats.duplicate_destroys(), 0);

    monitor.settle().await;
    assert_eq!(stats.destroyed(), 1);
    assert_eq!(stats.duplicate_destroys(), 0);
}

#[tokio::test(start_paused = true)]
async fn interrupted_wait_for_previous_release_stays_pending() {
    let provider = Arc::new(SimulatedProvider::new(SimulatedVideo::new(4.0)));
    let stats = provider.stats();
    let mut monitor = monitor_for(&provider);
    let mut reporter = reporter();

    monitor.watch(&video(), 1, &mut reporter).await.unwrap();

    // The next run is dropped while still waiting out the 1s grace delay.
    let next = tokio::time::timeout(
        Duration::from_millis(300),
        monitor.watch(&video(), 2, &mut reporter),
    )
    .await;
    assert!(next.is_err());
    assert_eq!(stats.destroyed(), 0);
    assert_eq!(provider.attempts(), 1, "second player never requested");

    monitor.settle().await;
    assert_eq!(stats.destroyed(), 1);
    assert_eq!(stats.duplicate_destroys(), 0);
}
