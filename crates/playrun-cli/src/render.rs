//! Human-readable rendering of session events.

use playrun_core::{SessionEvent, SessionEventKind, SessionOutcome};
use tracing::debug;

/// Format seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// One line describing an event, or `None` for events not worth a line.
pub fn describe(event: &SessionEvent) -> Option<String> {
    let state = &event.state;
    match &event.kind {
        SessionEventKind::RunStarted { run_number } => {
            let mut line = format!("Run {} of {}", run_number, state.total_runs);
            if state.completed_runs > 0 {
                line.push_str(&format!(" ({} completed)", state.completed_runs));
            }
            Some(line)
        }
        SessionEventKind::PlayerReady {
            title,
            duration_seconds,
            ..
        } => {
            if *duration_seconds > 0.0 {
                Some(format!("Now playing: {} ({})", title, format_time(*duration_seconds)))
            } else {
                Some(format!("Now playing: {} (duration unknown)", title))
            }
        }
        SessionEventKind::Progress { run_number } => {
            debug!(
                run_number,
                position = %format_time(state.current_time_seconds),
                total = %format_time(state.total_duration_seconds),
                percent = %format_args!("{:.1}", state.progress_percent),
                "Progress"
            );
            None
        }
        SessionEventKind::PlaybackStateChanged { .. } => None,
        SessionEventKind::RunCompleted { result } => {
            let mut line = format!(
                "Run {} complete: {} played",
                result.run_number,
                format_time(result.final_time_seconds.unwrap_or(result.duration_seconds))
            );
            if let Some(note) = &result.note {
                line.push_str(&format!(" ({})", note));
            }
            line.push_str(&format!(
                " [{}/{} runs, {:.0}%]",
                state.completed_runs,
                state.total_runs,
                state.overall_percent()
            ));
            Some(line)
        }
        SessionEventKind::CoolingDown { next_run, delay_ms } => Some(format!(
            "Waiting {:.1}s before run {}",
            *delay_ms as f64 / 1000.0,
            next_run
        )),
        SessionEventKind::Finished { outcome } => Some(summary(outcome)),
    }
}

/// Final summary line for a session.
pub fn summary(outcome: &SessionOutcome) -> String {
    match outcome {
        SessionOutcome::Complete { completed_runs } => {
            format!("Playback test complete: played the video {} times", completed_runs)
        }
        SessionOutcome::Failed {
            completed_runs,
            error,
        } => format!(
            "Failed to complete playback ({} phase): {} [{} runs completed]",
            error.phase(),
            error,
            completed_runs
        ),
        SessionOutcome::Cancelled { completed_runs } => {
            format!("Playback cancelled after {} completed runs", completed_runs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playrun_core::{RunError, RunResult, SessionId, SessionState};

    fn event(kind: SessionEventKind, state: SessionState) -> SessionEvent {
        SessionEvent::new(SessionId::new("s-1"), kind, state)
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(61.0), "1:01");
        assert_eq!(format_time(3725.0), "62:05");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn test_run_started_mentions_completed_runs() {
        let mut state = SessionState::started(3);
        state.complete_run(1);
        state.begin_run(2);

        let line = describe(&event(SessionEventKind::RunStarted { run_number: 2 }, state)).unwrap();
        assert_eq!(line, "Run 2 of 3 (1 completed)");
    }

    #[test]
    fn test_estimated_run_is_annotated() {
        let mut state = SessionState::started(2);
        state.complete_run(1);
        let result = RunResult::estimated(1, 30.0, Utc::now());

        let line = describe(&event(SessionEventKind::RunCompleted { result }, state)).unwrap();
        assert!(line.contains("0:30"));
        assert!(line.contains("estimated duration"));
        assert!(line.contains("[1/2 runs, 50%]"));
    }

    #[test]
    fn test_progress_is_not_printed() {
        let state = SessionState::started(1);
        assert!(describe(&event(SessionEventKind::Progress { run_number: 1 }, state)).is_none());
    }

    #[test]
    fn test_failure_summary_names_phase() {
        let line = summary(&SessionOutcome::Failed {
            completed_runs: 1,
            error: RunError::ApiLoadTimeout { after_secs: 10 },
        });
        assert!(line.contains("api-load phase"));
        assert!(line.contains("10 seconds"));
        assert!(line.contains("[1 runs completed]"));
    }
}
