//! SQLite-backed `UserOverride` store.
//!
//! Schema-as-const-string and WAL-mode bootstrap follow the signal
//! storage layer's `DbSignalStorage::new`; scale is tiny by comparison
//! (a few hundred product identities at most) so there is no need for
//! the covering indexes or FTS machinery that store carries.

use crate::models::{OverrideKind, UserOverride};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::sync::Arc;
use tracing::info;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS user_overrides (
    product_identity TEXT PRIMARY KEY,
    kind TEXT,
    custom_cadence_days INTEGER
) WITHOUT ROWID;
"#;

fn kind_to_text(kind: Option<OverrideKind>) -> Option<&'static str> {
    match kind {
        Some(OverrideKind::AlwaysPrune) => Some("always_prune"),
        Some(OverrideKind::NeverPrune) => Some("never_prune"),
        None => None,
    }
}

fn kind_from_text(text: Option<String>) -> Option<OverrideKind> {
    match text.as_deref() {
        Some("always_prune") => Some(OverrideKind::AlwaysPrune),
        Some("never_prune") => Some(OverrideKind::NeverPrune),
        _ => None,
    }
}

/// Stores and retrieves per-product overrides (always/never prune,
/// custom cadence) entered by the user in a prior review session.
pub struct PreferenceStore {
    conn: Arc<Mutex<Connection>>,
}

impl PreferenceStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("failed to open preferences db at {db_path}"))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("failed to initialize preferences schema")?;

        info!("preference store opened at: {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory db")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("failed to initialize preferences schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn upsert(&self, override_: &UserOverride) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO user_overrides (product_identity, kind, custom_cadence_days)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(product_identity) DO UPDATE SET
                kind = excluded.kind,
                custom_cadence_days = excluded.custom_cadence_days",
            params![
                override_.product_identity,
                kind_to_text(override_.kind),
                override_.custom_cadence_days,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, product_identity: &str) -> Result<Option<UserOverride>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT product_identity, kind, custom_cadence_days
             FROM user_overrides WHERE product_identity = ?1",
        )?;
        let mut rows = stmt.query([product_identity])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some(Self::row_to_override(row)?))
    }

    pub fn get_all(&self) -> Result<Vec<UserOverride>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare_cached("SELECT product_identity, kind, custom_cadence_days FROM user_overrides")?;
        let overrides = stmt
            .query_map([], Self::row_to_override)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(overrides)
    }

    pub fn remove(&self, product_identity: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "DELETE FROM user_overrides WHERE product_identity = ?1",
            [product_identity],
        )?;
        Ok(changed > 0)
    }

    fn row_to_override(row: &rusqlite::Row) -> rusqlite::Result<UserOverride> {
        let product_identity: String = row.get(0)?;
        let kind_text: Option<String> = row.get(1)?;
        let custom_cadence_days: Option<u32> = row.get(2)?;
        Ok(UserOverride {
            product_identity,
            kind: kind_from_text(kind_text),
            custom_cadence_days,
        })
    }
}
