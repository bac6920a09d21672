//! Rank Store Accessor
//!
//! Owns all reads and writes of the rank catalog and per-identity rank
//! assignments. Lower `level` = more authority; the catalog rank with the
//! maximum `level` is the system default handed to anyone never explicitly
//! ranked.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{Store, StoreError};
use crate::identity;

/// One entry of the (small, closed) rank catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub id: i64,
    pub name: String,
    pub level: i64,
}

/// An identity's current standing, joined with the referenced rank's level
/// (or the default rank's level when no explicit rank is set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStanding {
    /// Whether a row exists in the store for this identity.
    pub exists: bool,
    pub rank_id: Option<i64>,
    pub level: i64,
    pub blocked: bool,
}

/// Display view of an identity's rank, for the `!rank` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankDetail {
    pub rank_name: Option<String>,
    pub assigned_by: Option<String>,
    pub assigned_at: Option<String>,
}

impl Store {
    /// The system default rank: the catalog entry with the maximum `level`.
    pub async fn default_rank(&self) -> Result<Rank, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, level FROM ranks ORDER BY level DESC LIMIT 1",
                [],
                |row| {
                    Ok(Rank {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        level: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::EmptyCatalog)
        })
        .await
    }

    /// Case- and accent-insensitive exact match against the catalog.
    ///
    /// SQLite has no `unaccent`, and the catalog is a handful of rows, so we
    /// pull it and compare normalized names in Rust.
    pub async fn find_rank_by_name(&self, name: &str) -> Result<Option<Rank>, StoreError> {
        let wanted = identity::normalize_name(name);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT id, name, level FROM ranks")?;
            let rows = stmt.query_map([], |row| {
                Ok(Rank {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    level: row.get(2)?,
                })
            })?;
            for rank in rows {
                let rank = rank?;
                if identity::normalize_name(&rank.name) == wanted {
                    return Ok(Some(rank));
                }
            }
            Ok(None)
        })
        .await
    }

    /// Resolve an identity's standing.
    ///
    /// With `ensure = false` this never writes: unknown identities get a
    /// synthetic default-rank standing and no row. With `ensure = true` a
    /// missing row is created at the default rank via an atomic
    /// `ON CONFLICT DO NOTHING` upsert, safe under concurrent first-touch.
    pub async fn get_user_rank(
        &self,
        identity_key: &str,
        ensure: bool,
    ) -> Result<UserStanding, StoreError> {
        let default = self.default_rank().await?;
        let key = identity_key.to_string();
        self.with_conn(move |conn| {
            if ensure {
                conn.execute(
                    "INSERT INTO user_ranks (identity_key, rank_id, blocked)
                     VALUES (?1, ?2, 0)
                     ON CONFLICT(identity_key) DO NOTHING",
                    params![key, default.id],
                )?;
            }

            let row = conn
                .query_row(
                    "SELECT u.rank_id, u.blocked, c.level
                     FROM user_ranks u
                     LEFT JOIN ranks c ON u.rank_id = c.id
                     WHERE u.identity_key = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, Option<i64>>(0)?,
                            row.get::<_, bool>(1)?,
                            row.get::<_, Option<i64>>(2)?,
                        ))
                    },
                )
                .optional()?;

            Ok(match row {
                Some((rank_id, blocked, level)) => UserStanding {
                    exists: true,
                    rank_id,
                    // Null rank_id (or a dangling reference) falls back to
                    // the default rank's level.
                    level: level.unwrap_or(default.level),
                    blocked,
                },
                None => UserStanding {
                    exists: false,
                    rank_id: None,
                    level: default.level,
                    blocked: false,
                },
            })
        })
        .await
    }

    /// Upsert an identity's rank with audit metadata. Creates the row when
    /// absent (`blocked` defaults to false on creation, untouched on update).
    pub async fn set_user_rank(
        &self,
        target_key: &str,
        rank_id: i64,
        giver_key: &str,
    ) -> Result<(), StoreError> {
        let target = target_key.to_string();
        let giver = giver_key.to_string();
        self.with_conn(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO user_ranks (identity_key, rank_id, assigned_by, assigned_at, blocked)
                 VALUES (?1, ?2, ?3, ?4, 0)
                 ON CONFLICT(identity_key) DO UPDATE
                   SET rank_id = ?2, assigned_by = ?3, assigned_at = ?4",
                params![target, rank_id, giver, now],
            )?;
            Ok(())
        })
        .await
    }

    /// Set or clear the blocked flag, creating the row (at no explicit rank)
    /// when absent.
    pub async fn set_blocked(&self, identity_key: &str, blocked: bool) -> Result<(), StoreError> {
        let key = identity_key.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_ranks (identity_key, blocked)
                 VALUES (?1, ?2)
                 ON CONFLICT(identity_key) DO UPDATE SET blocked = ?2",
                params![key, blocked],
            )?;
            Ok(())
        })
        .await
    }

    /// Display view of an identity's current rank and audit trail.
    pub async fn user_rank_detail(
        &self,
        identity_key: &str,
    ) -> Result<Option<RankDetail>, StoreError> {
        let key = identity_key.to_string();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT c.name, u.assigned_by, u.assigned_at
                     FROM user_ranks u
                     LEFT JOIN ranks c ON u.rank_id = c.id
                     WHERE u.identity_key = ?1",
                    params![key],
                    |row| {
                        Ok(RankDetail {
                            rank_name: row.get(0)?,
                            assigned_by: row.get(1)?,
                            assigned_at: row.get(2)?,
                        })
                    },
                )
                .optional()?)
        })
        .await
    }
}
