//! SQLite persistence for brief sessions
//!
//! Each session is stored whole as a JSON document, next to a handful of
//! columns (name, view, step, timestamps) so listings never have to decode
//! the document. Activity lines from analysis runs are kept per session.
//!
//! # Database Schema
//!
//! 1. **sessions** - one row per session, `data` holds the full JSON state
//! 2. **session_activity** - timestamped activity lines (added in v2)
//! 3. **schema_version** - database schema version for migrations
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use seo_brief::database::Database;
//! use seo_brief::session::SessionState;
//! use seo_brief::types::{Keyword, MarketSettings, SubjectInputs};
//!
//! # fn main() -> anyhow::Result<()> {
//! let db = Database::new("/tmp/seo-brief/sessions.db".into())?;
//! db.initialize_schema()?;
//!
//! let state = SessionState::new(
//!     "trail shoes",
//!     vec![Keyword::new("trail running shoes", 1000)],
//!     MarketSettings::default(),
//!     SubjectInputs::default(),
//! );
//! db.upsert_session(&state)?;
//!
//! let loaded = db.get_session(&state.id)?;
//! assert_eq!(loaded.as_ref(), Some(&state));
//! # Ok(())
//! # }
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use seo_brief_sdk::LogLine;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::brief::View;
use crate::services::SessionStore;
use crate::session::{SessionState, SessionSummary};

/// Database wrapper for session persistence
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path`
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets a second CLI invocation read while one is writing
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Initialize database schema with all tables and indexes
    pub fn initialize_schema(&self) -> Result<()> {
        {
            let conn = self.conn()?;
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    view TEXT NOT NULL,
                    step INTEGER NOT NULL,
                    competitor_count INTEGER NOT NULL DEFAULT 0,
                    data TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at DESC);

                CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                );

                INSERT OR IGNORE INTO schema_version (version) VALUES (1);
                "#,
            )?;
        }

        self.migrate_to_v2()?;
        Ok(())
    }

    /// Migrate database schema to version 2 (per-session activity lines)
    pub fn migrate_to_v2(&self) -> Result<()> {
        let current = self.get_schema_version()?;

        if current < 2 {
            self.conn()?.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS session_activity (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id TEXT NOT NULL,
                    sequence INTEGER NOT NULL,
                    timestamp TEXT NOT NULL,
                    message TEXT NOT NULL,

                    FOREIGN KEY(session_id) REFERENCES sessions(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_activity_session_id
                ON session_activity(session_id, sequence);

                INSERT OR IGNORE INTO schema_version (version) VALUES (2);
                "#,
            )?;
        }

        Ok(())
    }

    pub fn get_schema_version(&self) -> Result<i32> {
        let version: i32 =
            self.conn()?
                .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                    row.get(0)
                })?;
        Ok(version)
    }

    /// Insert or replace a whole session
    pub fn upsert_session(&self, state: &SessionState) -> Result<()> {
        let data = serde_json::to_string(state)?;

        self.conn()?.execute(
            r#"
            INSERT INTO sessions (
                id, name, view, step, competitor_count, data, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                view = excluded.view,
                step = excluded.step,
                competitor_count = excluded.competitor_count,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
            params![
                state.id,
                state.name,
                view_to_string(state.wizard.view),
                state.wizard.step,
                state.competitors.len() as i64,
                data,
                timestamp(&state.created_at),
                timestamp(&state.updated_at),
            ],
        )?;

        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Option<SessionState>> {
        let data: Option<String> = self
            .conn()?
            .query_row(
                "SELECT data FROM sessions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Most recently updated first
    pub fn list_sessions(&self, limit: Option<usize>) -> Result<Vec<SessionSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, view, step, competitor_count, updated_at
            FROM sessions
            ORDER BY updated_at DESC
            LIMIT ?1
            "#,
        )?;

        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![limit], map_summary_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    /// Returns whether a row was removed. Activity lines go with it.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Append activity lines after whatever is already stored for the session
    pub fn append_activity(&self, session_id: &str, lines: &[LogLine]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let start: i64 = tx.query_row(
            "SELECT COUNT(*) FROM session_activity WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO session_activity (session_id, sequence, timestamp, message)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (offset, line) in lines.iter().enumerate() {
                stmt.execute(params![
                    session_id,
                    start + offset as i64,
                    line.timestamp.to_rfc3339(),
                    line.message,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Activity lines in the order they were written, optionally only the last `limit`
    pub fn get_activity(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<LogLine>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT timestamp, message FROM (
                SELECT sequence, timestamp, message
                FROM session_activity
                WHERE session_id = ?1
                ORDER BY sequence DESC
                LIMIT ?2
            ) ORDER BY sequence ASC
            "#,
        )?;

        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![session_id, limit], |row| {
            let timestamp: String = row.get(0)?;
            let message: String = row.get(1)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Local);
            Ok(LogLine { timestamp, message })
        })?;

        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn save(&self, state: &SessionState) -> Result<()> {
        self.upsert_session(state)
    }

    async fn load(&self, id: &str) -> Result<Option<SessionState>> {
        self.get_session(id)
    }

    async fn list(&self) -> Result<Vec<SessionSummary>> {
        self.list_sessions(None)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.delete_session(id)
    }
}

/// Fixed-width UTC timestamps so `ORDER BY updated_at` sorts correctly
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn view_to_string(view: View) -> &'static str {
    match view {
        View::Input => "input",
        View::Analyzing => "analyzing",
        View::Briefing => "briefing",
        View::Dashboard => "dashboard",
        View::Article => "article",
    }
}

fn string_to_view(s: &str) -> Result<View> {
    match s {
        "input" => Ok(View::Input),
        "analyzing" => Ok(View::Analyzing),
        "briefing" => Ok(View::Briefing),
        "dashboard" => Ok(View::Dashboard),
        "article" => Ok(View::Article),
        _ => Err(anyhow!("Unknown view: {}", s)),
    }
}

fn map_summary_row(row: &Row) -> rusqlite::Result<SessionSummary> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let view_str: String = row.get(2)?;
    let step: u8 = row.get(3)?;
    let competitor_count: i64 = row.get(4)?;
    let updated_at_str: String = row.get(5)?;

    let view = string_to_view(&view_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;

    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(SessionSummary {
        id,
        name,
        view,
        step,
        competitor_count: competitor_count.max(0) as usize,
        updated_at,
    })
}
