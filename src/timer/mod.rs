pub mod commands;
pub mod controller;
pub mod display;
pub mod engine;
pub mod state;

use serde::Serialize;

use crate::db::SessionRecord;
use crate::narration::{NarrationCategory, NarrationState};
use crate::schedule::Phase;

pub use controller::SessionController;
pub use display::Milestone;
pub use engine::{SessionCue, SessionEngine};
pub use state::{ClockState, SessionAction, SessionStatus};

/// Everything the host needs to draw the session screen.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub title: String,
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub phase: Phase,
    pub phase_elapsed_secs: u64,
    pub phase_remaining_secs: u64,
    pub display_secs: u64,
    pub count_up: bool,
    pub session_progress: f64,
    pub break_progress: f64,
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub milestones: Vec<Milestone>,
    pub next_reminder_secs: Option<u32>,
    pub narration: NarrationState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SessionEvent {
    StatusChanged { status: SessionStatus },
    NarrationStarted { category: NarrationCategory },
    NarrationFinished { category: NarrationCategory, text: String },
    Tick { snapshot: SessionSnapshot },
    Finished { record: SessionRecord },
}
