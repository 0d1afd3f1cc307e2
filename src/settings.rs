use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};
use uuid::Uuid;

use crate::{
    error::{SessionError, SessionResult},
    models::SessionConfig,
    narration::PacedPlayer,
};

/// Per-install preferences that outlive any one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub user_id: String,
    /// Start the timer face counting up instead of down.
    pub count_up: bool,
    /// How long a narration line stays up when no clip is played.
    pub narration_secs: f64,
    /// Directory holding `<category>.mp3|wav|ogg` clips.
    pub clips_dir: Option<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            count_up: false,
            narration_secs: PacedPlayer::DEFAULT_HOLD.as_secs_f64(),
            clips_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredSettings {
    session_config: Option<SessionConfig>,
    preferences: Preferences,
}

/// `settings.json`: the session config written by the setup flow plus
/// preferences. Every update is written through to disk.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<StoredSettings>,
}

impl ConfigStore {
    /// Opens `path`, starting from defaults when the file does not exist yet.
    /// A file that exists but does not parse is an error rather than being
    /// silently replaced.
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            StoredSettings::default()
        };

        let store = Self {
            path,
            data: RwLock::new(data),
        };
        // Pins the generated user id on first run.
        if !store.path.exists() {
            store.persist(&store.read()?)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// The config a new session opens with, clamped into range.
    pub fn load_session_config(&self) -> SessionResult<SessionConfig> {
        let data = self.read().map_err(SessionError::Config)?;
        data.session_config
            .map(|config| config.sanitized())
            .ok_or(SessionError::ConfigMissing)
    }

    pub fn save_session_config(&self, config: SessionConfig) -> Result<()> {
        self.update(|data| data.session_config = Some(config))
    }

    pub fn preferences(&self) -> Result<Preferences> {
        Ok(self.read()?.preferences)
    }

    pub fn update_preferences(&self, preferences: Preferences) -> Result<()> {
        self.update(|data| data.preferences = preferences)
    }

    fn read(&self) -> Result<StoredSettings> {
        self.data
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))
    }

    fn update(&self, apply: impl FnOnce(&mut StoredSettings)) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &StoredSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
