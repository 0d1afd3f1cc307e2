use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{from_sql_int, parse_timestamp, to_sql_int},
    models::{SessionRecord, SessionStats},
    SessionStore,
};

fn row_to_record(row: &Row) -> Result<SessionRecord> {
    let planned: i64 = row.get("planned_duration_minutes")?;
    let time_spent: i64 = row.get("time_spent_secs")?;
    let completed: i64 = row.get("completed")?;
    let started_at: String = row.get("started_at")?;
    let completed_at: String = row.get("completed_at")?;

    Ok(SessionRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        goal: row.get("goal")?,
        planned_duration_minutes: from_sql_int(planned, "planned_duration_minutes")?,
        time_spent_secs: from_sql_int(time_spent, "time_spent_secs")?,
        completed: completed != 0,
        started_at: parse_timestamp(&started_at, "started_at")?,
        completed_at: parse_timestamp(&completed_at, "completed_at")?,
    })
}

impl Database {
    pub async fn insert_session_record(&self, record: &SessionRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, title, goal, planned_duration_minutes, time_spent_secs, completed, started_at, completed_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.user_id,
                    record.title,
                    record.goal,
                    record.planned_duration_minutes,
                    to_sql_int(record.time_spent_secs)?,
                    record.completed,
                    record.started_at.to_rfc3339(),
                    record.completed_at.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to insert session {}", record.id))?;
            Ok(())
        })
        .await
    }

    pub async fn list_sessions_for_user(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, goal, planned_duration_minutes, time_spent_secs, completed, started_at, completed_at
                 FROM sessions
                 WHERE user_id = ?1
                 ORDER BY started_at DESC",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }

    pub async fn session_stats(&self, user_id: &str) -> Result<SessionStats> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let (total, completed, focus): (i64, i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(completed), 0), COALESCE(SUM(time_spent_secs), 0)
                 FROM sessions
                 WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            Ok(SessionStats {
                total_sessions: from_sql_int(total, "total_sessions")?,
                completed_sessions: from_sql_int(completed, "completed_sessions")?,
                total_focus_secs: from_sql_int(focus, "total_focus_secs")?,
            })
        })
        .await
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn append(&self, record: SessionRecord) -> Result<()> {
        self.insert_session_record(&record).await
    }

    async fn query_all(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        self.list_sessions_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(id: &str, user_id: &str, minutes_ago: i64, completed: bool) -> SessionRecord {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let started_at = base - Duration::minutes(minutes_ago);
        SessionRecord {
            id: id.into(),
            user_id: user_id.into(),
            title: "Reading".into(),
            goal: "Two chapters".into(),
            planned_duration_minutes: 60,
            time_spent_secs: if completed { 3_600 } else { 1_200 },
            completed,
            started_at,
            completed_at: started_at + Duration::minutes(60),
        }
    }

    #[tokio::test]
    async fn append_then_query_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("history.sqlite3")).unwrap();

        db.append(record("old", "ana", 300, true)).await.unwrap();
        db.append(record("new", "ana", 10, false)).await.unwrap();
        db.append(record("other", "ben", 5, true)).await.unwrap();

        let records = db.query_all("ana").await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(records[1], record("old", "ana", 300, true));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let db = Database::in_memory().unwrap();

        db.append(record("same", "ana", 10, true)).await.unwrap();
        assert!(db.append(record("same", "ana", 10, true)).await.is_err());
    }

    #[tokio::test]
    async fn stats_aggregate_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("history.sqlite3")).unwrap();

        db.append(record("a", "ana", 100, true)).await.unwrap();
        db.append(record("b", "ana", 50, false)).await.unwrap();
        db.append(record("c", "ben", 50, true)).await.unwrap();

        let stats = db.session_stats("ana").await.unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(stats.total_focus_secs, 4_800);
        assert!((stats.completion_rate() - 50.0).abs() < f64::EPSILON);

        let records = db.query_all("ana").await.unwrap();
        assert_eq!(SessionStats::from_records(&records), stats);

        let empty = db.session_stats("nobody").await.unwrap();
        assert_eq!(empty, SessionStats::default());
        assert_eq!(empty.completion_rate(), 0.0);
    }
}
