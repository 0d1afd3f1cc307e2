//! Pomodoro break placement for a single session.

use serde::{Deserialize, Serialize};

/// Sessions shorter than this never get breaks.
pub const MIN_MINUTES_FOR_BREAKS: u32 = 60;

/// Sessions at or above this length switch from 25/5 to 50/10 cycles.
pub const LONG_SESSION_MINUTES: u32 = 120;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroFormat {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl PomodoroFormat {
    pub fn cycle_minutes(&self) -> u32 {
        self.work_minutes + self.break_minutes
    }

    /// Number of work blocks the session is split into, a trailing partial
    /// cycle included.
    pub fn total_cycles(&self, duration_minutes: u32) -> u32 {
        duration_minutes.div_ceil(self.cycle_minutes())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BreakWindow {
    /// Minutes from session start.
    pub start_minute: u32,
    pub duration_minutes: u32,
    /// 1-based.
    pub sequence: u32,
}

impl BreakWindow {
    pub fn end_minute(&self) -> u32 {
        self.start_minute + self.duration_minutes
    }

    pub fn start_secs(&self) -> u64 {
        u64::from(self.start_minute) * 60
    }

    pub fn end_secs(&self) -> u64 {
        u64::from(self.end_minute()) * 60
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// Half-open: the first second of the next work block is not part of the break.
    pub fn contains(&self, elapsed_secs: u64) -> bool {
        elapsed_secs >= self.start_secs() && elapsed_secs < self.end_secs()
    }
}

pub fn pomodoro_format(duration_minutes: u32) -> PomodoroFormat {
    if duration_minutes < LONG_SESSION_MINUTES {
        PomodoroFormat {
            work_minutes: 25,
            break_minutes: 5,
        }
    } else {
        PomodoroFormat {
            work_minutes: 50,
            break_minutes: 10,
        }
    }
}

/// One break after every full work block, except a break that would touch the
/// end of the session: the session never finishes in the middle of a break.
pub fn compute_schedule(duration_minutes: u32, breaks_enabled: bool) -> Vec<BreakWindow> {
    if !breaks_enabled || duration_minutes < MIN_MINUTES_FOR_BREAKS {
        return Vec::new();
    }

    let format = pomodoro_format(duration_minutes);
    let full_cycles = duration_minutes / format.cycle_minutes();

    (0..full_cycles)
        .map(|i| BreakWindow {
            start_minute: (i + 1) * format.work_minutes + i * format.break_minutes,
            duration_minutes: format.break_minutes,
            sequence: i + 1,
        })
        .filter(|window| window.end_minute() < duration_minutes)
        .collect()
}
