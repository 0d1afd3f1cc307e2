use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::NarrationCategory;

/// Plays one narration and resolves once it is over.
///
/// Implementations may fail; the coordinator logs the error and carries on
/// as if the clip had finished.
#[async_trait]
pub trait NarrationPlayer: Send + Sync {
    async fn play(&self, category: NarrationCategory, text: &str) -> Result<()>;
}

/// Holds the overlay for a fixed time instead of playing audio. Used when no
/// clips are configured, and in tests.
#[derive(Debug, Clone, Copy)]
pub struct PacedPlayer {
    hold: Duration,
}

impl PacedPlayer {
    pub const DEFAULT_HOLD: Duration = Duration::from_secs(2);

    pub fn new(hold: Duration) -> Self {
        Self { hold }
    }
}

impl Default for PacedPlayer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOLD)
    }
}

#[async_trait]
impl NarrationPlayer for PacedPlayer {
    async fn play(&self, _category: NarrationCategory, _text: &str) -> Result<()> {
        tokio::time::sleep(self.hold).await;
        Ok(())
    }
}
