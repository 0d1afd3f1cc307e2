//! Persisted outcome of one session run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Written once when a session completes or is stopped; never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub goal: String,
    pub planned_duration_minutes: u32,
    /// Elapsed session seconds when the session ended, pauses excluded.
    pub time_spent_secs: u64,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// History aggregates for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_focus_secs: u64,
}

impl SessionStats {
    pub fn from_records(records: &[SessionRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total_sessions += 1;
            if record.completed {
                stats.completed_sessions += 1;
            }
            stats.total_focus_secs += record.time_spent_secs;
            stats
        })
    }

    /// Percentage of sessions seen through to the end.
    pub fn completion_rate(&self) -> f64 {
        if self.total_sessions == 0 {
            return 0.0;
        }
        self.completed_sessions as f64 / self.total_sessions as f64 * 100.0
    }
}
