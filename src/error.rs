use thiserror::Error;

use crate::timer::{SessionAction, SessionStatus};

/// Failures surfaced by the session core.
///
/// Narration problems never show up here: a clip that fails to play is logged
/// and treated as finished so the timer keeps moving.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No `sessionConfig` in the config store. The host should send the user to
    /// the setup flow instead of opening a session.
    #[error("no session configuration found; run `focusmom configure` first")]
    ConfigMissing,

    #[error("cannot {action} a session that is {status}")]
    InvalidTransition {
        action: SessionAction,
        status: SessionStatus,
    },

    #[error("failed to read session configuration")]
    Config(#[source] anyhow::Error),

    #[error("failed to persist session record")]
    Persistence(#[source] anyhow::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
