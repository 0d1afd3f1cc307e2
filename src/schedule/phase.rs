//! Work/break phase derived from elapsed session time.
//!
//! Nothing here is stored: the phase is recomputed from the elapsed seconds on
//! every tick, so a tick that arrives late (backgrounded host, suspended
//! laptop) still lands in exactly one phase.

use serde::Serialize;

use super::breaks::BreakWindow;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Phase {
    /// `cycle` is 1-based: the work block before the first break is cycle 1.
    Work { cycle: u32 },
    Break { window: BreakWindow },
}

impl Phase {
    pub fn is_break(&self) -> bool {
        matches!(self, Phase::Break { .. })
    }

    pub fn break_window(&self) -> Option<&BreakWindow> {
        match self {
            Phase::Break { window } => Some(window),
            Phase::Work { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInfo {
    pub phase: Phase,
    /// Seconds into the current break, or into the whole session while working.
    pub phase_elapsed: u64,
    /// Seconds left in the current break, or in the whole session while working.
    pub phase_remaining: u64,
}

impl PhaseInfo {
    pub fn is_break(&self) -> bool {
        self.phase.is_break()
    }
}

/// Work time is measured against the whole session rather than the current
/// Pomodoro block, so the countdown never jumps back up after a break.
pub fn resolve_phase(elapsed_secs: u64, schedule: &[BreakWindow], total_secs: u64) -> PhaseInfo {
    if let Some(window) = schedule.iter().find(|w| w.contains(elapsed_secs)) {
        let phase_elapsed = elapsed_secs - window.start_secs();
        return PhaseInfo {
            phase: Phase::Break { window: *window },
            phase_elapsed,
            phase_remaining: window.duration_secs() - phase_elapsed,
        };
    }

    let finished_breaks = schedule
        .iter()
        .filter(|w| w.end_secs() <= elapsed_secs)
        .count() as u32;

    PhaseInfo {
        phase: Phase::Work {
            cycle: finished_breaks + 1,
        },
        phase_elapsed: elapsed_secs,
        phase_remaining: total_secs.saturating_sub(elapsed_secs),
    }
}

pub fn is_session_complete(elapsed_secs: u64, schedule: &[BreakWindow], total_secs: u64) -> bool {
    elapsed_secs >= total_secs && !schedule.iter().any(|w| w.contains(elapsed_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::breaks::compute_schedule;

    #[test]
    fn mid_break_reports_break_progress() {
        let schedule = compute_schedule(150, true);
        let info = resolve_phase(3_300, &schedule, 9_000);

        assert_eq!(info.phase.break_window().map(|w| w.sequence), Some(1));
        assert_eq!(info.phase_elapsed, 300);
        assert_eq!(info.phase_remaining, 300);
    }

    #[test]
    fn break_boundaries_are_half_open() {
        let schedule = compute_schedule(150, true);

        assert!(!resolve_phase(2_999, &schedule, 9_000).is_break());
        assert!(resolve_phase(3_000, &schedule, 9_000).is_break());
        assert!(resolve_phase(3_599, &schedule, 9_000).is_break());

        let after = resolve_phase(3_600, &schedule, 9_000);
        assert_eq!(after.phase, Phase::Work { cycle: 2 });
        assert_eq!(after.phase_remaining, 5_400);
    }

    #[test]
    fn work_remaining_counts_down_whole_session() {
        let schedule = compute_schedule(90, true);
        let info = resolve_phase(600, &schedule, 5_400);

        assert_eq!(info.phase, Phase::Work { cycle: 1 });
        assert_eq!(info.phase_elapsed, 600);
        assert_eq!(info.phase_remaining, 4_800);
    }

    #[test]
    fn every_second_resolves_to_exactly_one_phase() {
        let schedule = compute_schedule(360, true);
        let total = 360 * 60;
        for elapsed in (0..total + 120).step_by(7) {
            let info = resolve_phase(elapsed, &schedule, total);
            let inside = schedule.iter().filter(|w| w.contains(elapsed)).count();
            assert!(inside <= 1);
            assert_eq!(info.is_break(), inside == 1, "elapsed {elapsed}");
        }
    }

    #[test]
    fn overshoot_past_the_end_is_work_with_nothing_left() {
        let schedule = compute_schedule(150, true);
        let info = resolve_phase(20_000, &schedule, 9_000);

        assert_eq!(info.phase, Phase::Work { cycle: 3 });
        assert_eq!(info.phase_remaining, 0);
        assert!(is_session_complete(20_000, &schedule, 9_000));
    }

    #[test]
    fn not_complete_before_total() {
        let schedule = compute_schedule(150, true);
        assert!(!is_session_complete(8_999, &schedule, 9_000));
        assert!(is_session_complete(9_000, &schedule, 9_000));
    }
}
