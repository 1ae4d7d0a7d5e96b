//! SQLite-backed `RunState` checkpoint store, so a crashed or restarted
//! process can recover the last known run status instead of starting
//! blind. Schema-as-const-string and WAL-mode bootstrap follow
//! `signals/db_storage.rs::DbSignalStorage::new`.

use crate::models::{RunError, RunState, RunStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::sync::Arc;
use tracing::info;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS run_state (
    run_id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    phase TEXT NOT NULL,
    checkpoint TEXT NOT NULL,
    recovery_needed INTEGER NOT NULL,
    error TEXT,
    updated_at TEXT NOT NULL
) WITHOUT ROWID;
"#;

fn status_to_text(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Idle => "idle",
        RunStatus::Running => "running",
        RunStatus::Paused => "paused",
        RunStatus::Review => "review",
        RunStatus::Complete => "complete",
        RunStatus::Cancelled => "cancelled",
    }
}

fn status_from_text(text: &str) -> Result<RunStatus> {
    match text {
        "idle" => Ok(RunStatus::Idle),
        "running" => Ok(RunStatus::Running),
        "paused" => Ok(RunStatus::Paused),
        "review" => Ok(RunStatus::Review),
        "complete" => Ok(RunStatus::Complete),
        "cancelled" => Ok(RunStatus::Cancelled),
        other => anyhow::bail!("unknown run status in checkpoint row: {other}"),
    }
}

/// Persists and reloads the single `RunState` the orchestrator is
/// currently driving. Rows are keyed by `run_id` but in practice there is
/// at most one live row at a time — a new run overwrites rather than
/// accumulates history.
pub struct RunStateStore {
    conn: Arc<Mutex<Connection>>,
}

impl RunStateStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("failed to open run-state db at {db_path}"))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("failed to initialize run-state schema")?;

        info!("run-state store opened at: {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory db")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("failed to initialize run-state schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn save(&self, state: &RunState) -> Result<()> {
        let conn = self.conn.lock();
        let error_json = state
            .error
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("failed to serialize run error")?;
        conn.execute(
            "INSERT INTO run_state
                (run_id, status, phase, checkpoint, recovery_needed, error, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(run_id) DO UPDATE SET
                status = excluded.status,
                phase = excluded.phase,
                checkpoint = excluded.checkpoint,
                recovery_needed = excluded.recovery_needed,
                error = excluded.error,
                updated_at = excluded.updated_at",
            params![
                state.run_id,
                status_to_text(state.status),
                state.phase,
                state.checkpoint.to_string(),
                state.recovery_needed,
                error_json,
                state.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn load(&self, run_id: &str) -> Result<Option<RunState>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT run_id, status, phase, checkpoint, recovery_needed, error, updated_at
             FROM run_state WHERE run_id = ?1",
        )?;
        let mut rows = stmt.query([run_id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(Self::row_to_state(row)?))
    }

    /// Loads the most recently updated checkpoint, regardless of
    /// `run_id` — used at process start, before the orchestrator knows
    /// which run (if any) it is recovering.
    pub fn load_latest(&self) -> Result<Option<RunState>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT run_id, status, phase, checkpoint, recovery_needed, error, updated_at
             FROM run_state ORDER BY updated_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(Self::row_to_state(row)?))
    }

    fn row_to_state(row: &rusqlite::Row) -> Result<RunState> {
        let run_id: String = row.get(0)?;
        let status_text: String = row.get(1)?;
        let phase: String = row.get(2)?;
        let checkpoint_text: String = row.get(3)?;
        let recovery_needed: bool = row.get(4)?;
        let error_text: Option<String> = row.get(5)?;
        let updated_at_text: String = row.get(6)?;

        let status = status_from_text(&status_text)?;
        let checkpoint = serde_json::from_str(&checkpoint_text)
            .context("failed to deserialize run checkpoint")?;
        let error = error_text
            .map(|t| serde_json::from_str::<RunError>(&t))
            .transpose()
            .context("failed to deserialize run error")?;
        let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_at_text)
            .context("failed to parse updated_at")?
            .with_timezone(&Utc);

        Ok(RunState {
            run_id,
            status,
            phase,
            checkpoint,
            recovery_needed,
            error,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_and_reloads_a_run_state_by_id() {
        let store = RunStateStore::in_memory().unwrap();
        let mut state = RunState::new("run-1");
        state.status = RunStatus::Running;
        state.phase = "reordering".to_string();
        state.checkpoint = serde_json::json!({"orderIndex": 2});
        store.save(&state).unwrap();

        let loaded = store.load("run-1").unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::Running);
        assert_eq!(loaded.phase, "reordering");
        assert_eq!(loaded.checkpoint["orderIndex"], 2);
    }

    #[test]
    fn missing_run_id_returns_none() {
        let store = RunStateStore::in_memory().unwrap();
        assert!(store.load("nonexistent").unwrap().is_none());
    }

    #[test]
    fn save_overwrites_existing_row_for_same_run_id() {
        let store = RunStateStore::in_memory().unwrap();
        let mut state = RunState::new("run-1");
        state.status = RunStatus::Running;
        store.save(&state).unwrap();

        state.status = RunStatus::Review;
        state.recovery_needed = true;
        store.save(&state).unwrap();

        let loaded = store.load("run-1").unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::Review);
        assert!(loaded.recovery_needed);
    }

    #[test]
    fn round_trips_an_error_payload() {
        let store = RunStateStore::in_memory().unwrap();
        let mut state = RunState::new("run-1");
        state.status = RunStatus::Paused;
        state.error = Some(RunError {
            message: "selector not found: reorder_trigger".to_string(),
            recoverable: true,
        });
        store.save(&state).unwrap();

        let loaded = store.load("run-1").unwrap().unwrap();
        let error = loaded.error.unwrap();
        assert_eq!(error.message, "selector not found: reorder_trigger");
        assert!(error.recoverable);
    }

    #[test]
    fn load_latest_returns_the_most_recently_saved_state() {
        let store = RunStateStore::in_memory().unwrap();
        let mut first = RunState::new("run-1");
        first.updated_at = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store.save(&first).unwrap();

        let mut second = RunState::new("run-2");
        second.status = RunStatus::Paused;
        second.updated_at = DateTime::parse_from_rfc3339("2026-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store.save(&second).unwrap();

        let latest = store.load_latest().unwrap().unwrap();
        assert_eq!(latest.run_id, "run-2");
        assert_eq!(latest.status, RunStatus::Paused);
    }

    #[test]
    fn opens_on_disk_db_via_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_state.db");
        let store = RunStateStore::open(path.to_str().unwrap()).unwrap();
        let state = RunState::new("run-1");
        store.save(&state).unwrap();
        assert!(store.load("run-1").unwrap().is_some());
    }
}
