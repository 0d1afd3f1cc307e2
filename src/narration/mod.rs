//! The strict-parent voice: one narration at a time, never overlapping.
//!
//! Every narration goes through [`NarrationCoordinator::begin`], which waits
//! for whatever is already speaking, shows the text, awaits the player, and
//! goes back to idle. While it is speaking the session controller evaluates
//! neither phase transitions nor reminders.

#[cfg(feature = "audio")]
pub mod clip;
pub mod phrases;
pub mod player;

use std::{sync::Arc, time::Duration};

use log::{info, warn};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

#[cfg(feature = "audio")]
pub use clip::ClipPlayer;
pub use phrases::PhraseBook;
pub use player::{NarrationPlayer, PacedPlayer};

/// A narration that takes longer than this is abandoned.
pub const MAX_NARRATION: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NarrationCategory {
    SessionStart,
    BreakStart,
    BreakEnd,
    FocusReminder,
    SessionPause,
    SessionQuit,
    SessionEnd,
}

impl NarrationCategory {
    pub const ALL: [NarrationCategory; 7] = [
        NarrationCategory::SessionStart,
        NarrationCategory::BreakStart,
        NarrationCategory::BreakEnd,
        NarrationCategory::FocusReminder,
        NarrationCategory::SessionPause,
        NarrationCategory::SessionQuit,
        NarrationCategory::SessionEnd,
    ];

    /// Also the clip file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrationCategory::SessionStart => "session_start",
            NarrationCategory::BreakStart => "break_start",
            NarrationCategory::BreakEnd => "break_end",
            NarrationCategory::FocusReminder => "focus_reminder",
            NarrationCategory::SessionPause => "session_pause",
            NarrationCategory::SessionQuit => "session_quit",
            NarrationCategory::SessionEnd => "session_end",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NarrationState {
    pub is_playing: bool,
    pub category: Option<NarrationCategory>,
    pub text: String,
}

#[derive(Clone)]
pub struct NarrationCoordinator {
    player: Arc<dyn NarrationPlayer>,
    phrases: PhraseBook,
    /// Held for the whole of a narration; queues concurrent callers.
    gate: Arc<Mutex<()>>,
    state: Arc<watch::Sender<NarrationState>>,
    max_duration: Duration,
}

impl NarrationCoordinator {
    pub fn new(player: Arc<dyn NarrationPlayer>) -> Self {
        let (state, _) = watch::channel(NarrationState::default());
        Self {
            player,
            phrases: PhraseBook,
            gate: Arc::new(Mutex::new(())),
            state: Arc::new(state),
            max_duration: MAX_NARRATION,
        }
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn is_speaking(&self) -> bool {
        self.state.borrow().is_playing
    }

    pub fn state(&self) -> NarrationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NarrationState> {
        self.state.subscribe()
    }

    /// Speaks a random line of `category`; returns the line that was spoken.
    pub async fn speak(&self, category: NarrationCategory) -> String {
        let text = self.phrases.pick(category).to_string();
        self.begin(category, text.clone()).await;
        text
    }

    /// Plays `text` once any narration already in progress has finished.
    /// Playback errors and timeouts are logged, never returned.
    pub async fn begin(&self, category: NarrationCategory, text: String) {
        let _turn = self.gate.lock().await;

        info!("[{}] {}", category.as_str(), text);
        self.state.send_replace(NarrationState {
            is_playing: true,
            category: Some(category),
            text: text.clone(),
        });

        match tokio::time::timeout(self.max_duration, self.player.play(category, &text)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("narration {} failed: {err:#}", category.as_str()),
            Err(_) => warn!(
                "narration {} exceeded {:?}; moving on",
                category.as_str(),
                self.max_duration
            ),
        }

        self.state.send_replace(NarrationState::default());
    }
}
