//! What the timer face shows. Purely presentational: nothing here feeds back
//! into phase resolution.

use serde::Serialize;

use crate::schedule::{BreakWindow, PhaseInfo};

/// `h:mm:ss` from an hour up, `m:ss` below.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Count-up shows time into the break, or into the session while working.
/// Count-down shows what is left of either.
pub fn display_secs(info: &PhaseInfo, count_up: bool, started: bool, total_secs: u64) -> u64 {
    if !started {
        return if count_up { 0 } else { total_secs };
    }
    if count_up {
        info.phase_elapsed
    } else {
        info.phase_remaining
    }
}

/// Session progress in percent, clamped to 0..=100.
pub fn session_progress(elapsed_secs: u64, total_secs: u64) -> f64 {
    if total_secs == 0 {
        return 0.0;
    }
    (elapsed_secs as f64 / total_secs as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn break_progress(info: &PhaseInfo) -> f64 {
    match info.phase.break_window() {
        Some(window) if window.duration_secs() > 0 => {
            (info.phase_elapsed as f64 / window.duration_secs() as f64 * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub label: String,
    /// Position along the progress bar, percent.
    pub position: f64,
    pub passed: bool,
}

/// Start, each break, end.
pub fn milestones(schedule: &[BreakWindow], duration_minutes: u32, progress: f64) -> Vec<Milestone> {
    let mut out = Vec::with_capacity(schedule.len() + 2);
    out.push(Milestone {
        label: "Start".into(),
        position: 0.0,
        passed: progress > 0.0,
    });

    for window in schedule {
        let position = f64::from(window.start_minute) / f64::from(duration_minutes.max(1)) * 100.0;
        out.push(Milestone {
            label: format!("Break {}", window.sequence),
            position,
            passed: progress >= position,
        });
    }

    out.push(Milestone {
        label: "End".into(),
        position: 100.0,
        passed: progress >= 100.0,
    });
    out
}
