//! Focus reminders: when the strict parent checks in on you.
//!
//! Offsets come from a fixed table picked by strictness and Pomodoro split.
//! The scheduler fires at most one offset per check and then backs off for a
//! short cooldown, so a host that wakes up after minutes in the background
//! plays the next overdue reminder rather than the whole backlog.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use super::breaks::LONG_SESSION_MINUTES;

/// Quiet period after a reminder fires or any narration finishes.
pub const REMINDER_COOLDOWN: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StrictnessLevel {
    Chill,
    Medium,
    Insane,
}

impl StrictnessLevel {
    pub fn from_strictness(strictness: u8) -> Self {
        match strictness {
            0..=32 => StrictnessLevel::Chill,
            33..=66 => StrictnessLevel::Medium,
            _ => StrictnessLevel::Insane,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrictnessLevel::Chill => "chill",
            StrictnessLevel::Medium => "medium",
            StrictnessLevel::Insane => "insane",
        }
    }
}

// Minutes from session start.
const CHILL_SHORT: &[f64] = &[15.0, 45.0, 75.0, 105.0];
const CHILL_LONG: &[f64] = &[
    20.0, 40.0, 80.0, 100.0, 140.0, 160.0, 200.0, 220.0, 260.0, 280.0, 320.0, 340.0,
];
const MEDIUM_SHORT: &[f64] = &[10.0, 20.0, 40.0, 50.0, 70.0, 80.0, 100.0, 110.0];
const MEDIUM_LONG: &[f64] = &[
    10.0, 20.0, 30.0, 40.0, 70.0, 80.0, 90.0, 100.0, 130.0, 140.0, 150.0, 160.0, 190.0, 200.0,
    210.0, 220.0, 250.0, 260.0, 270.0, 280.0, 310.0, 320.0, 330.0, 340.0,
];
const INSANE_SHORT: &[f64] = &[
    6.0, 12.0, 18.0, 36.0, 42.0, 48.0, 66.0, 72.0, 78.0, 96.0, 102.0, 108.0,
];
const INSANE_LONG: &[f64] = &[
    7.5, 15.0, 22.5, 30.0, 37.5, 45.0, 67.5, 75.0, 82.5, 90.0, 97.5, 105.0, 127.5, 135.0, 142.5,
    150.0, 157.5, 165.0, 187.5, 195.0, 202.5, 210.0, 217.5, 225.0, 247.5, 255.0, 262.5, 270.0,
    277.5, 285.0, 307.5, 315.0, 322.5, 330.0, 337.5, 345.0,
];

fn table(level: StrictnessLevel, long_split: bool) -> &'static [f64] {
    match (level, long_split) {
        (StrictnessLevel::Chill, false) => CHILL_SHORT,
        (StrictnessLevel::Chill, true) => CHILL_LONG,
        (StrictnessLevel::Medium, false) => MEDIUM_SHORT,
        (StrictnessLevel::Medium, true) => MEDIUM_LONG,
        (StrictnessLevel::Insane, false) => INSANE_SHORT,
        (StrictnessLevel::Insane, true) => INSANE_LONG,
    }
}

/// Sorted reminder offsets in seconds, limited to the session length.
pub fn compute_reminder_offsets(duration_minutes: u32, strictness: u8) -> Vec<u32> {
    let level = StrictnessLevel::from_strictness(strictness);
    let long_split = duration_minutes >= LONG_SESSION_MINUTES;
    let limit = duration_minutes * 60;

    let mut offsets: Vec<u32> = table(level, long_split)
        .iter()
        .map(|minutes| (minutes * 60.0).round() as u32)
        .filter(|secs| *secs < limit)
        .collect();
    offsets.sort_unstable();
    offsets.dedup();
    offsets
}

#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    offsets: Vec<u32>,
    fired: Vec<bool>,
    cooldown_until: Option<Instant>,
}

impl ReminderScheduler {
    pub fn new(duration_minutes: u32, strictness: u8) -> Self {
        Self::from_offsets(compute_reminder_offsets(duration_minutes, strictness))
    }

    pub fn from_offsets(mut offsets: Vec<u32>) -> Self {
        offsets.sort_unstable();
        offsets.dedup();
        let fired = vec![false; offsets.len()];
        Self {
            offsets,
            fired,
            cooldown_until: None,
        }
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn fired_count(&self) -> usize {
        self.fired.iter().filter(|fired| **fired).count()
    }

    pub fn pending(&self) -> usize {
        self.offsets.len() - self.fired_count()
    }

    /// Next offset that has not fired yet, due or not.
    pub fn next_offset(&self) -> Option<u32> {
        self.offsets
            .iter()
            .zip(&self.fired)
            .find(|(_, fired)| !**fired)
            .map(|(offset, _)| *offset)
    }

    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Returns the earliest unfired offset that is due and marks it fired.
    ///
    /// Nothing fires inside a break, while narration is on screen, or during a
    /// cooldown. Only one offset fires per call however many are overdue.
    pub fn check_due(
        &mut self,
        elapsed_secs: u64,
        now: Instant,
        in_break: bool,
        overlay_active: bool,
    ) -> Option<u32> {
        if in_break || overlay_active || self.in_cooldown(now) {
            return None;
        }

        let index = self
            .offsets
            .iter()
            .zip(&self.fired)
            .position(|(offset, fired)| !*fired && u64::from(*offset) <= elapsed_secs)?;

        self.fired[index] = true;
        self.hold_off(now, REMINDER_COOLDOWN);
        Some(self.offsets[index])
    }

    /// Called whenever any narration finishes.
    pub fn note_speech(&mut self, now: Instant) {
        self.hold_off(now, REMINDER_COOLDOWN);
    }

    /// Suppresses reminders until `now + quiet`. Never shortens a longer cooldown.
    pub fn hold_off(&mut self, now: Instant, quiet: Duration) {
        let until = now + quiet;
        if self.cooldown_until.map_or(true, |current| current < until) {
            self.cooldown_until = Some(until);
        }
    }

    /// Clears fired state; only a session restart does this, never pause/resume.
    pub fn reset(&mut self) {
        self.fired.iter_mut().for_each(|fired| *fired = false);
        self.cooldown_until = None;
    }
}
