//! Session state machine, free of any I/O.
//!
//! The engine owns the clock, break schedule and reminder scheduler of one
//! session and turns "what time is it now" into at most one [`SessionCue`]
//! per tick. Transitions come from comparing the current phase with the one
//! seen on the previous tick, never from counting ticks, so a tick that
//! arrives after a long gap still produces each transition exactly once.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::time::Instant;
use uuid::Uuid;

use super::display;
use super::state::{ClockState, SessionAction, SessionStatus};
use super::SessionSnapshot;
use crate::db::SessionRecord;
use crate::error::{SessionError, SessionResult};
use crate::models::SessionConfig;
use crate::narration::NarrationState;
use crate::schedule::{
    compute_schedule, is_session_complete, pomodoro_format, resolve_phase, BreakWindow, Phase,
    PhaseInfo, ReminderScheduler,
};

/// Completion is not checked this long after a break ends.
pub const BREAK_EXIT_GUARD: Duration = Duration::from_secs(2);

/// No reminder this long after the session starts or resumes.
pub const RESUME_HOLD_OFF: Duration = Duration::from_secs(3);

/// Something the controller has to narrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCue {
    BreakStarted(BreakWindow),
    BreakEnded(BreakWindow),
    FocusReminder { offset_secs: u32 },
    /// The session reached its planned length; the engine is already `Completed`.
    Finished(SessionRecord),
}

#[derive(Debug, Clone)]
pub struct SessionEngine {
    config: SessionConfig,
    user_id: String,
    schedule: Vec<BreakWindow>,
    reminders: ReminderScheduler,
    clock: ClockState,
    status: SessionStatus,
    last_phase: Option<Phase>,
    completion_guard_until: Option<Instant>,
    count_up: bool,
}

impl SessionEngine {
    pub fn new(config: SessionConfig, user_id: impl Into<String>) -> Self {
        let config = config.sanitized();
        let schedule = compute_schedule(config.duration_minutes, config.breaks_enabled);
        let reminders = ReminderScheduler::new(config.duration_minutes, config.strictness);

        debug!(
            "session '{}': {} breaks, {} reminders",
            config.title,
            schedule.len(),
            reminders.offsets().len()
        );

        Self {
            config,
            user_id: user_id.into(),
            schedule,
            reminders,
            clock: ClockState::new(),
            status: SessionStatus::NotStarted,
            last_phase: None,
            completion_guard_until: None,
            count_up: false,
        }
    }

    pub fn schedule(&self) -> &[BreakWindow] {
        &self.schedule
    }

    pub fn reminders(&self) -> &ReminderScheduler {
        &self.reminders
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn total_secs(&self) -> u64 {
        self.config.total_secs()
    }

    pub fn elapsed_secs_at(&self, now: Instant) -> u64 {
        self.clock.elapsed_secs_at(now)
    }

    pub fn phase_at(&self, now: Instant) -> PhaseInfo {
        resolve_phase(
            self.clock.elapsed_secs_at(now),
            &self.schedule,
            self.total_secs(),
        )
    }

    /// Checks that `action` is allowed right now, without changing anything.
    /// The controller calls this before playing the narration that precedes
    /// the transition.
    pub fn ensure_can(&self, action: SessionAction) -> SessionResult<()> {
        if action.allowed_from(self.status) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    /// NotStarted/Paused → Running.
    pub fn start(&mut self, now: Instant, wall: DateTime<Utc>) -> SessionResult<()> {
        self.ensure_can(SessionAction::Start)?;

        let resuming = self.status == SessionStatus::Paused;
        self.clock.start_at(now, wall);
        self.status = SessionStatus::Running;
        self.reminders.hold_off(now, RESUME_HOLD_OFF);
        if self.last_phase.is_none() {
            self.last_phase = Some(self.phase_at(now).phase);
        }

        info!(
            "session '{}' {} at {}s",
            self.config.title,
            if resuming { "resumed" } else { "started" },
            self.clock.elapsed_secs_at(now)
        );
        Ok(())
    }

    /// Running → Paused. Elapsed time freezes until the next `start`.
    pub fn pause(&mut self, now: Instant) -> SessionResult<()> {
        self.ensure_can(SessionAction::Pause)?;
        self.clock.pause_at(now);
        self.status = SessionStatus::Paused;
        info!(
            "session '{}' paused at {}s",
            self.config.title,
            self.clock.elapsed_secs_at(now)
        );
        Ok(())
    }

    /// Running/Paused → Stopped. Elapsed time is captured and frozen at `now`.
    pub fn stop(&mut self, now: Instant, wall: DateTime<Utc>) -> SessionResult<SessionRecord> {
        self.ensure_can(SessionAction::Stop)?;
        self.clock.pause_at(now);
        self.status = SessionStatus::Stopped;

        let record = self.record(false, now, wall);
        info!(
            "session '{}' stopped after {}s of {}s",
            self.config.title,
            record.time_spent_secs,
            self.total_secs()
        );
        Ok(record)
    }

    /// Stopped/Completed → NotStarted with a fresh clock and reminder state.
    pub fn restart(&mut self) -> SessionResult<()> {
        self.ensure_can(SessionAction::Restart)?;
        self.clock.reset();
        self.reminders.reset();
        self.status = SessionStatus::NotStarted;
        self.last_phase = None;
        self.completion_guard_until = None;
        Ok(())
    }

    /// Any narration just finished.
    pub fn note_speech(&mut self, now: Instant) {
        self.reminders.note_speech(now);
    }

    pub fn toggle_count_up(&mut self) -> bool {
        self.count_up = !self.count_up;
        self.count_up
    }

    /// Evaluates one tick. Does nothing unless running and no narration is
    /// on screen. Priority: phase transition, then completion, then reminder.
    pub fn tick(&mut self, now: Instant, overlay_active: bool) -> Option<SessionCue> {
        if self.status != SessionStatus::Running || overlay_active {
            return None;
        }

        let elapsed = self.clock.elapsed_secs_at(now);
        let info = resolve_phase(elapsed, &self.schedule, self.total_secs());
        let previous = self.last_phase.replace(info.phase);

        if let Some(cue) = self.transition(previous, info.phase, now) {
            return Some(cue);
        }

        let guarded = self.completion_guard_until.is_some_and(|until| now < until);
        if is_session_complete(elapsed, &self.schedule, self.total_secs()) && !guarded {
            self.clock.pause_at(now);
            self.status = SessionStatus::Completed;
            let record = self.record(true, now, Utc::now());
            info!(
                "session '{}' completed after {}s",
                self.config.title, record.time_spent_secs
            );
            return Some(SessionCue::Finished(record));
        }

        self.reminders
            .check_due(elapsed, now, info.is_break(), overlay_active)
            .map(|offset_secs| SessionCue::FocusReminder { offset_secs })
    }

    fn transition(
        &mut self,
        previous: Option<Phase>,
        current: Phase,
        now: Instant,
    ) -> Option<SessionCue> {
        match (previous?, current) {
            (Phase::Work { .. }, Phase::Break { window }) => Some(SessionCue::BreakStarted(window)),
            // Jumped straight from one break into a later one.
            (Phase::Break { window: before }, Phase::Break { window })
                if before.sequence != window.sequence =>
            {
                Some(SessionCue::BreakStarted(window))
            }
            (Phase::Break { window }, Phase::Work { .. }) => {
                self.completion_guard_until = Some(now + BREAK_EXIT_GUARD);
                Some(SessionCue::BreakEnded(window))
            }
            // A late tick skipped a whole break. Only the last one is narrated.
            (Phase::Work { cycle: before }, Phase::Work { cycle }) if cycle > before => {
                let window = *self
                    .schedule
                    .iter()
                    .find(|window| window.sequence + 1 == cycle)?;
                self.completion_guard_until = Some(now + BREAK_EXIT_GUARD);
                Some(SessionCue::BreakEnded(window))
            }
            _ => None,
        }
    }

    fn record(&self, completed: bool, now: Instant, wall: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            title: self.config.title.clone(),
            goal: self.config.goal.clone(),
            planned_duration_minutes: self.config.duration_minutes,
            time_spent_secs: self.clock.elapsed_secs_at(now),
            completed,
            started_at: self.clock.started_at().unwrap_or(wall),
            completed_at: wall,
        }
    }

    pub fn snapshot(&self, now: Instant, narration: NarrationState) -> SessionSnapshot {
        let elapsed = self.clock.elapsed_secs_at(now);
        let total = self.total_secs();
        let info = resolve_phase(elapsed, &self.schedule, total);
        let started = self.clock.has_started();
        let progress = display::session_progress(elapsed, total);
        let format = pomodoro_format(self.config.duration_minutes);

        let current_cycle = match info.phase {
            Phase::Work { cycle } => cycle,
            Phase::Break { window } => window.sequence,
        };

        SessionSnapshot {
            status: self.status,
            title: self.config.title.clone(),
            elapsed_secs: elapsed,
            total_secs: total,
            phase: info.phase,
            phase_elapsed_secs: info.phase_elapsed,
            phase_remaining_secs: info.phase_remaining,
            display_secs: display::display_secs(&info, self.count_up, started, total),
            count_up: self.count_up,
            session_progress: progress,
            break_progress: display::break_progress(&info),
            current_cycle,
            total_cycles: format.total_cycles(self.config.duration_minutes),
            milestones: display::milestones(&self.schedule, self.config.duration_minutes, progress),
            next_reminder_secs: self.reminders.next_offset(),
            narration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(duration_minutes: u32, breaks_enabled: bool, strictness: u8) -> SessionConfig {
        SessionConfig {
            title: "Taxes".into(),
            goal: "File them".into(),
            duration_minutes,
            breaks_enabled,
            workplace: "kitchen".into(),
            strictness,
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn started(config: SessionConfig) -> (SessionEngine, Instant) {
        let t0 = Instant::now();
        let mut engine = SessionEngine::new(config, "tester");
        engine.start(t0, Utc::now()).unwrap();
        (engine, t0)
    }

    #[test]
    fn ticks_before_start_or_while_paused_do_nothing() {
        let t0 = Instant::now();
        let mut engine = SessionEngine::new(config(30, false, 100), "tester");
        assert_eq!(engine.tick(t0 + secs(5_000), false), None);

        engine.start(t0, Utc::now()).unwrap();
        engine.pause(t0 + secs(10)).unwrap();
        assert_eq!(engine.tick(t0 + secs(5_000), false), None);
        assert_eq!(engine.elapsed_secs_at(t0 + secs(5_000)), 10);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let t0 = Instant::now();
        let mut engine = SessionEngine::new(config(30, false, 0), "tester");

        assert!(matches!(
            engine.pause(t0),
            Err(SessionError::InvalidTransition {
                action: SessionAction::Pause,
                ..
            })
        ));
        assert!(engine.stop(t0, Utc::now()).is_err());
        assert!(engine.restart().is_err());

        engine.start(t0, Utc::now()).unwrap();
        assert!(engine.start(t0, Utc::now()).is_err());
    }

    #[test]
    fn break_start_and_end_are_cued_once() {
        let (mut engine, t0) = started(config(150, true, 0));

        // Overdue reminders may fire on the surrounding ticks; only transitions matter here.
        assert!(!matches!(
            engine.tick(t0 + secs(2_999), false),
            Some(SessionCue::BreakStarted(_))
        ));
        assert!(matches!(
            engine.tick(t0 + secs(3_000), false),
            Some(SessionCue::BreakStarted(BreakWindow { sequence: 1, .. }))
        ));
        assert_eq!(engine.tick(t0 + secs(3_001), false), None);

        assert!(matches!(
            engine.tick(t0 + secs(3_600), false),
            Some(SessionCue::BreakEnded(BreakWindow { sequence: 1, .. }))
        ));
        assert!(!matches!(
            engine.tick(t0 + secs(3_601), false),
            Some(SessionCue::BreakEnded(_))
        ));
    }

    #[test]
    fn no_reminders_inside_a_break() {
        // First tick lands in the break with four medium reminders already overdue.
        let (mut engine, t0) = started(config(150, true, 50));
        assert!(matches!(
            engine.tick(t0 + secs(3_000), false),
            Some(SessionCue::BreakStarted(_))
        ));
        for s in 3_001..3_600 {
            assert_eq!(engine.tick(t0 + secs(s), false), None, "second {s}");
        }
    }

    #[test]
    fn backlog_of_reminders_fires_one_at_a_time() {
        let (mut engine, t0) = started(config(90, false, 100));

        let now = t0 + secs(30 * 60);
        assert_eq!(
            engine.tick(now, false),
            Some(SessionCue::FocusReminder { offset_secs: 360 })
        );
        assert_eq!(engine.tick(now, false), None);
        assert_eq!(
            engine.tick(now + secs(2), false),
            Some(SessionCue::FocusReminder { offset_secs: 720 })
        );
    }

    #[test]
    fn overlay_blocks_evaluation() {
        let (mut engine, t0) = started(config(90, false, 100));
        assert_eq!(engine.tick(t0 + secs(400), true), None);
        assert!(engine.tick(t0 + secs(400), false).is_some());
    }

    #[test]
    fn no_reminder_right_after_start() {
        let (mut engine, t0) = started(config(90, false, 100));
        engine.pause(t0 + secs(359)).unwrap();
        engine.start(t0 + secs(400), Utc::now()).unwrap();

        // Offset 360 is due one second after resuming, but the hold-off applies.
        assert_eq!(engine.tick(t0 + secs(402), false), None);
        assert!(engine.tick(t0 + secs(403), false).is_some());
    }

    #[test]
    fn completes_at_planned_length() {
        let (mut engine, t0) = started(config(30, false, 0));
        let _ = engine.tick(t0 + secs(900), false);

        assert_eq!(engine.tick(t0 + secs(1_799), false), None);
        match engine.tick(t0 + secs(1_800), false) {
            Some(SessionCue::Finished(record)) => {
                assert!(record.completed);
                assert_eq!(record.time_spent_secs, 1_800);
                assert_eq!(record.planned_duration_minutes, 30);
                assert_eq!(record.user_id, "tester");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert_eq!(engine.tick(t0 + secs(1_900), false), None);
    }

    #[test]
    fn late_tick_after_break_ends_before_completing() {
        // 60 min at 25/5: one break at 25-30.
        let (mut engine, t0) = started(config(60, true, 0));
        assert!(matches!(
            engine.tick(t0 + secs(25 * 60), false),
            Some(SessionCue::BreakStarted(_))
        ));

        // Host slept through the rest of the session.
        let late = t0 + secs(4_000);
        assert!(matches!(
            engine.tick(late, false),
            Some(SessionCue::BreakEnded(_))
        ));
        assert!(!matches!(
            engine.tick(late + secs(1), false),
            Some(SessionCue::Finished(_))
        ));
        assert!(matches!(
            engine.tick(late + BREAK_EXIT_GUARD, false),
            Some(SessionCue::Finished(_))
        ));
    }

    #[test]
    fn tick_that_skips_a_whole_break_still_ends_it() {
        // 60 min at 25/5: one break at 25-30.
        let (mut engine, t0) = started(config(60, true, 0));
        assert_eq!(engine.tick(t0 + secs(10 * 60), false), None);

        // Next tick lands in the second work block.
        assert!(matches!(
            engine.tick(t0 + secs(40 * 60), false),
            Some(SessionCue::BreakEnded(BreakWindow { sequence: 1, .. }))
        ));
        for s in (40 * 60 + 1)..(40 * 60 + 30) {
            assert!(
                !matches!(
                    engine.tick(t0 + secs(s), false),
                    Some(SessionCue::BreakStarted(_) | SessionCue::BreakEnded(_))
                ),
                "second {s}"
            );
        }
    }

    #[test]
    fn skipping_the_last_break_still_guards_completion() {
        let (mut engine, t0) = started(config(60, true, 0));
        assert_eq!(engine.tick(t0 + secs(10 * 60), false), None);

        let late = t0 + secs(4_000);
        assert!(matches!(
            engine.tick(late, false),
            Some(SessionCue::BreakEnded(BreakWindow { sequence: 1, .. }))
        ));
        assert!(!matches!(
            engine.tick(late + secs(1), false),
            Some(SessionCue::Finished(_))
        ));
        assert!(matches!(
            engine.tick(late + BREAK_EXIT_GUARD, false),
            Some(SessionCue::Finished(_))
        ));
    }

    #[test]
    fn stop_records_elapsed_at_the_moment_of_stopping() {
        let (mut engine, t0) = started(config(120, true, 40));
        engine.pause(t0 + secs(600)).unwrap();
        engine.start(t0 + secs(900), Utc::now()).unwrap();

        let record = engine.stop(t0 + secs(1_500), Utc::now()).unwrap();
        assert!(!record.completed);
        assert_eq!(record.time_spent_secs, 1_200);
        assert_eq!(engine.status(), SessionStatus::Stopped);
        assert_eq!(engine.elapsed_secs_at(t0 + secs(9_999)), 1_200);
    }

    #[test]
    fn restart_resets_clock_and_reminders() {
        let (mut engine, t0) = started(config(90, false, 100));
        assert!(engine.tick(t0 + secs(400), false).is_some());
        engine.stop(t0 + secs(500), Utc::now()).unwrap();

        engine.restart().unwrap();
        assert_eq!(engine.status(), SessionStatus::NotStarted);
        assert_eq!(engine.reminders().fired_count(), 0);

        let t1 = t0 + secs(1_000);
        engine.start(t1, Utc::now()).unwrap();
        assert_eq!(engine.elapsed_secs_at(t1 + secs(10)), 10);
    }

    #[test]
    fn snapshot_reflects_break_and_count_mode() {
        let (mut engine, t0) = started(config(150, true, 0));
        let now = t0 + secs(3_300);

        let snapshot = engine.snapshot(now, NarrationState::default());
        assert!(snapshot.phase.is_break());
        assert_eq!(snapshot.display_secs, 300);
        assert_eq!(snapshot.current_cycle, 1);
        assert_eq!(snapshot.total_cycles, 3);

        engine.toggle_count_up();
        let snapshot = engine.snapshot(now, NarrationState::default());
        assert_eq!(snapshot.display_secs, 300);
        assert!(snapshot.count_up);

        let later = engine.snapshot(t0 + secs(4_000), NarrationState::default());
        assert_eq!(later.display_secs, 4_000);
        assert_eq!(later.phase, Phase::Work { cycle: 2 });
    }
}
