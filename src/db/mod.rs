mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

use anyhow::Result;
use async_trait::async_trait;

pub use connection::Database;
pub use models::{SessionRecord, SessionStats};

/// Append-only home for finished sessions.
///
/// The controller only ever appends; `query_all` feeds history views.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn append(&self, record: SessionRecord) -> Result<()>;

    /// Every record of `user_id`, newest first.
    async fn query_all(&self, user_id: &str) -> Result<Vec<SessionRecord>>;
}
