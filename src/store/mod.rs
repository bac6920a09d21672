//! Persistent Store
//!
//! SQLite-backed persistence for the rank catalog, per-identity rank
//! assignments, command policies and counters. Every operation opens a
//! short-lived connection inside `spawn_blocking`; every mutation is a
//! single atomic upsert statement so concurrent actors converge on one
//! row instead of racing into duplicate-key failures.

pub mod counters;
pub mod ranks;
pub mod registry;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::task;
use tracing::info;

/// Failures surfaced by the store accessors.
///
/// Denial outcomes are never errors: these cover infrastructure faults and
/// the empty-catalog deployment precondition only.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be reached or a blocking task was lost.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The rank catalog has no rows, so no default rank exists. Fatal at
    /// startup; the engines cannot bootstrap identities without it.
    #[error("rank catalog is empty")]
    EmptyCatalog,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Handle to the SQLite store. Cheap to clone; connections are opened per
/// operation on the blocking pool.
#[derive(Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database and ensure the schema exists.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };

        store
            .with_conn(|conn| {
                conn.execute_batch(
                    r#"
                    CREATE TABLE IF NOT EXISTS ranks (
                        id INTEGER PRIMARY KEY,
                        name TEXT NOT NULL UNIQUE,
                        level INTEGER NOT NULL
                    );
                    CREATE TABLE IF NOT EXISTS user_ranks (
                        identity_key TEXT PRIMARY KEY,
                        rank_id INTEGER REFERENCES ranks(id),
                        assigned_by TEXT,
                        assigned_at TEXT,
                        blocked INTEGER NOT NULL DEFAULT 0
                    );
                    CREATE TABLE IF NOT EXISTS command_policies (
                        name TEXT PRIMARY KEY,
                        min_level INTEGER NOT NULL,
                        enabled INTEGER NOT NULL DEFAULT 1
                    );
                    CREATE TABLE IF NOT EXISTS counters (
                        counter_name TEXT PRIMARY KEY,
                        value INTEGER NOT NULL DEFAULT 0,
                        last_update TEXT
                    );
                    "#,
                )?;
                Ok(())
            })
            .await?;

        Ok(store)
    }

    /// Seed the default rank catalog and command policies, only when the
    /// respective tables are empty. Deployments that seed out-of-band are
    /// left untouched.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        let seeded = self
            .with_conn(|conn| {
                let ranks: i64 =
                    conn.query_row("SELECT COUNT(*) FROM ranks", [], |row| row.get(0))?;
                if ranks == 0 {
                    let catalog: &[(&str, i64)] = &[
                        ("Owner", 0),
                        ("General", 1),
                        ("Captain", 2),
                        ("Sergeant", 3),
                        ("Soldier", 4),
                        ("Recruit", 5),
                    ];
                    for (name, level) in catalog {
                        conn.execute(
                            "INSERT INTO ranks (name, level) VALUES (?1, ?2)",
                            rusqlite::params![name, level],
                        )?;
                    }
                }

                let policies: &[(&str, i64)] = &[
                    ("!ping", 5),
                    ("!id", 5),
                    ("!rank", 5),
                    ("!dice", 5),
                    ("!sticker", 5),
                    ("!lost", 5),
                    ("!draw", 3),
                    ("!all", 2),
                    ("!addrank", 2),
                    ("!setlevel", 0),
                ];
                for (name, min_level) in policies {
                    conn.execute(
                        "INSERT INTO command_policies (name, min_level, enabled)
                         VALUES (?1, ?2, 1)
                         ON CONFLICT(name) DO NOTHING",
                        rusqlite::params![name, min_level],
                    )?;
                }

                Ok(ranks == 0)
            })
            .await?;

        if seeded {
            info!("📦 Seeded default rank catalog");
        }
        Ok(())
    }

    /// Run a closure against a fresh connection on the blocking pool.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.db_path.clone();
        task::spawn_blocking(move || {
            let conn = Connection::open(&path)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            // Writers briefly lock the whole database; wait instead of failing.
            conn.busy_timeout(Duration::from_secs(5))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}
