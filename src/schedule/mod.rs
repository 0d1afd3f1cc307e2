pub mod breaks;
pub mod phase;
pub mod reminders;

pub use breaks::{compute_schedule, pomodoro_format, BreakWindow, PomodoroFormat};
pub use phase::{is_session_complete, resolve_phase, Phase, PhaseInfo};
pub use reminders::{compute_reminder_offsets, ReminderScheduler, StrictnessLevel};
