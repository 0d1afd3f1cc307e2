use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    Running,
    Paused,
    Stopped,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SessionStatus::Stopped | SessionStatus::Completed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-initiated transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    Pause,
    Stop,
    Restart,
}

impl SessionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::Start => "start",
            SessionAction::Pause => "pause",
            SessionAction::Stop => "stop",
            SessionAction::Restart => "restart",
        }
    }

    /// Whether the action is legal from `status`.
    pub fn allowed_from(&self, status: SessionStatus) -> bool {
        match self {
            SessionAction::Start => {
                matches!(status, SessionStatus::NotStarted | SessionStatus::Paused)
            }
            SessionAction::Pause => status == SessionStatus::Running,
            SessionAction::Stop => {
                matches!(status, SessionStatus::Running | SessionStatus::Paused)
            }
            SessionAction::Restart => status.is_finished(),
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elapsed session time across pause/resume cycles.
///
/// Elapsed time is derived from anchors rather than counted per tick, so a
/// late or skipped tick never loses or double-counts time.
#[derive(Debug, Clone, Default)]
pub struct ClockState {
    /// Wall-clock time of the first start, for the session record.
    started_at: Option<DateTime<Utc>>,
    start_anchor: Option<Instant>,
    pause_anchor: Option<Instant>,
    /// Sum of all completed pauses; only ever grows.
    paused_total: Duration,
}

impl ClockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_started(&self) -> bool {
        self.start_anchor.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.pause_anchor.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn paused_total(&self) -> Duration {
        self.paused_total
    }

    /// First call starts the clock; a call while paused resumes it. A call while
    /// already running does nothing.
    pub fn start_at(&mut self, now: Instant, wall: DateTime<Utc>) {
        if self.start_anchor.is_none() {
            self.start_anchor = Some(now);
            self.started_at = Some(wall);
            return;
        }

        if let Some(paused_at) = self.pause_anchor.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    /// Freezes elapsed time. No-op if never started or already paused.
    pub fn pause_at(&mut self, now: Instant) {
        if self.start_anchor.is_some() && self.pause_anchor.is_none() {
            self.pause_anchor = Some(now);
        }
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(start) = self.start_anchor else {
            return Duration::ZERO;
        };
        let until = self.pause_anchor.unwrap_or(now);
        until
            .saturating_duration_since(start)
            .saturating_sub(self.paused_total)
    }

    pub fn elapsed_secs_at(&self, now: Instant) -> u64 {
        self.elapsed_at(now).as_secs()
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now(), Utc::now());
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_secs_at(Instant::now())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn actions_follow_the_status_table() {
        use SessionAction::*;
        use SessionStatus::*;

        let allowed = |action: SessionAction| {
            [NotStarted, Running, Paused, Stopped, Completed]
                .into_iter()
                .filter(|status| action.allowed_from(*status))
                .collect::<Vec<_>>()
        };
        assert_eq!(allowed(Start), vec![NotStarted, Paused]);
        assert_eq!(allowed(Pause), vec![Running]);
        assert_eq!(allowed(Stop), vec![Running, Paused]);
        assert_eq!(allowed(Restart), vec![Stopped, Completed]);
        assert_eq!(Restart.to_string(), "restart");
    }

    #[test]
    fn zero_before_start() {
        let clock = ClockState::new();
        assert_eq!(clock.elapsed_secs_at(Instant::now() + secs(50)), 0);
        assert_eq!(clock.elapsed_seconds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn runtime_clock_helpers_track_virtual_time() {
        let mut clock = ClockState::new();
        clock.start();
        tokio::time::sleep(secs(40)).await;
        clock.pause();
        tokio::time::sleep(secs(100)).await;
        assert_eq!(clock.elapsed_seconds(), 40);

        clock.start();
        tokio::time::sleep(secs(5)).await;
        assert_eq!(clock.elapsed_seconds(), 45);
    }

    #[test]
    fn pause_freezes_and_resume_continues_from_frozen_value() {
        let t0 = Instant::now();
        let mut clock = ClockState::new();
        clock.start_at(t0, Utc::now());

        assert_eq!(clock.elapsed_secs_at(t0 + secs(100)), 100);

        clock.pause_at(t0 + secs(100));
        assert_eq!(clock.elapsed_secs_at(t0 + secs(100)), 100);
        assert_eq!(clock.elapsed_secs_at(t0 + secs(400)), 100);

        clock.start_at(t0 + secs(400), Utc::now());
        assert_eq!(clock.elapsed_secs_at(t0 + secs(400)), 100);
        assert_eq!(clock.elapsed_secs_at(t0 + secs(460)), 160);
        assert_eq!(clock.paused_total(), secs(300));
    }

    #[test]
    fn repeated_pause_and_start_are_idempotent() {
        let t0 = Instant::now();
        let mut clock = ClockState::new();
        clock.start_at(t0, Utc::now());
        clock.start_at(t0 + secs(5), Utc::now());

        clock.pause_at(t0 + secs(10));
        clock.pause_at(t0 + secs(20));
        assert_eq!(clock.elapsed_secs_at(t0 + secs(30)), 10);

        clock.start_at(t0 + secs(30), Utc::now());
        assert_eq!(clock.elapsed_secs_at(t0 + secs(31)), 11);
    }

    #[test]
    fn pause_before_start_is_ignored() {
        let t0 = Instant::now();
        let mut clock = ClockState::new();
        clock.pause_at(t0);
        assert!(!clock.is_paused());

        clock.start_at(t0 + secs(1), Utc::now());
        assert_eq!(clock.elapsed_secs_at(t0 + secs(11)), 10);
    }

    #[test]
    fn elapsed_is_monotonic_across_cycles() {
        let t0 = Instant::now();
        let mut clock = ClockState::new();
        clock.start_at(t0, Utc::now());

        let mut last = 0;
        for step in 1..200u64 {
            let now = t0 + Duration::from_millis(step * 730);
            match step % 17 {
                5 => clock.pause_at(now),
                11 => clock.start_at(now, Utc::now()),
                _ => {}
            }
            let elapsed = clock.elapsed_secs_at(now);
            assert!(elapsed >= last, "went backwards at step {step}");
            last = elapsed;
        }
    }

    #[test]
    fn never_negative_for_stale_now() {
        let t0 = Instant::now();
        let mut clock = ClockState::new();
        clock.start_at(t0 + secs(10), Utc::now());
        assert_eq!(clock.elapsed_secs_at(t0), 0);
    }

    #[test]
    fn reset_forgets_everything() {
        let t0 = Instant::now();
        let mut clock = ClockState::new();
        clock.start_at(t0, Utc::now());
        clock.pause_at(t0 + secs(3));
        clock.reset();

        assert!(!clock.has_started());
        assert!(clock.started_at().is_none());
        assert_eq!(clock.paused_total(), Duration::ZERO);
    }
}
