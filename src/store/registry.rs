//! Command Registry Accessor
//!
//! Reads and mutates the per-command policy rows: the minimum rank level a
//! command requires and whether it is enabled at all.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{Store, StoreError};

/// Policy row for one known command token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPolicy {
    pub min_level: i64,
    pub enabled: bool,
}

impl Store {
    /// Exact-match lookup on the literal command token (prefix included).
    pub async fn get_policy(&self, name: &str) -> Result<Option<CommandPolicy>, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT min_level, enabled FROM command_policies WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok(CommandPolicy {
                            min_level: row.get(0)?,
                            enabled: row.get(1)?,
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    /// Update a command's required level. Returns false when the command
    /// name is unknown; the affected-row count is the whole check.
    pub async fn set_min_level(&self, name: &str, level: i64) -> Result<bool, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE command_policies SET min_level = ?1 WHERE name = ?2",
                params![level, name],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    /// Insert or overwrite a policy row, for registering commands the
    /// seeded catalog does not know about. Not on the runtime command path.
    pub async fn upsert_policy(
        &self,
        name: &str,
        min_level: i64,
        enabled: bool,
    ) -> Result<(), StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO command_policies (name, min_level, enabled)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET min_level = ?2, enabled = ?3",
                params![name, min_level, enabled],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::store::testutil::test_store;

    #[tokio::test]
    async fn policy_lookup_is_exact_match() {
        let (store, _guard) = test_store().await;
        let policy = store.get_policy("!ping").await.unwrap().unwrap();
        assert_eq!(policy.min_level, 5);
        assert!(policy.enabled);
        assert!(store.get_policy("ping").await.unwrap().is_none());
        assert!(store.get_policy("!nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_min_level_reports_unknown_commands() {
        let (store, _guard) = test_store().await;
        assert!(!store.set_min_level("!nope", 1).await.unwrap());
        assert!(store.get_policy("!nope").await.unwrap().is_none());

        assert!(store.set_min_level("!dice", 2).await.unwrap());
        let policy = store.get_policy("!dice").await.unwrap().unwrap();
        assert_eq!(policy.min_level, 2);
    }

    #[tokio::test]
    async fn disabled_policy_round_trips() {
        let (store, _guard) = test_store().await;
        store.upsert_policy("!dice", 5, false).await.unwrap();
        let policy = store.get_policy("!dice").await.unwrap().unwrap();
        assert!(!policy.enabled);
    }
}
